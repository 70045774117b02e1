use crate::foundation::core::{Plane, SampleType};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::percentile_sorted;

/// Reduction over the z-axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Per-pixel maximum.
    Max,
    /// Per-pixel minimum.
    Min,
    /// Per-pixel mean.
    Mean,
    /// Per-pixel median.
    Median,
    /// Per-pixel population standard deviation.
    Std,
    /// Per-pixel sum.
    Sum,
}

impl Projection {
    /// Parse a projection name; an `all-` prefix is accepted.
    pub fn parse(name: &str) -> ReelResult<Self> {
        let n = name.trim().to_ascii_lowercase();
        let n = n.strip_prefix("all-").unwrap_or(&n);
        match n {
            "max" => Ok(Self::Max),
            "min" => Ok(Self::Min),
            "mean" | "avg" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "std" => Ok(Self::Std),
            "sum" => Ok(Self::Sum),
            _ => Err(ReelError::configuration(format!(
                "unknown z projection '{name}'"
            ))),
        }
    }

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Min => "min",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Std => "std",
            Self::Sum => "sum",
        }
    }

    /// Reduce same-shaped planes pixel by pixel.
    ///
    /// `max`/`min` keep the input sample type; the other reductions produce `f32`.
    pub fn reduce(self, planes: &[Plane]) -> ReelResult<Plane> {
        let first = planes
            .first()
            .ok_or_else(|| ReelError::dimension_mismatch("projection of zero planes"))?;
        if let Some(p) = planes.iter().find(|p| p.shape() != first.shape()) {
            return Err(ReelError::dimension_mismatch(format!(
                "z planes differ in shape: {}x{} vs {}x{}",
                first.width, first.height, p.width, p.height
            )));
        }

        let n = first.data.len();
        let count = planes.len() as f32;
        let mut column = Vec::with_capacity(planes.len());
        let mut data = Vec::with_capacity(n);
        for i in 0..n {
            column.clear();
            column.extend(planes.iter().map(|p| p.data[i]));
            let v = match self {
                Self::Max => column.iter().copied().fold(f32::NEG_INFINITY, f32::max),
                Self::Min => column.iter().copied().fold(f32::INFINITY, f32::min),
                Self::Sum => column.iter().sum(),
                Self::Mean => column.iter().sum::<f32>() / count,
                Self::Std => {
                    let mean = column.iter().sum::<f32>() / count;
                    (column.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / count).sqrt()
                }
                Self::Median => {
                    column.sort_by(f32::total_cmp);
                    percentile_sorted(&column, 50.0) as f32
                }
            };
            data.push(v);
        }

        let sample = match self {
            Self::Max | Self::Min => first.sample,
            _ => SampleType::F32,
        };
        Plane::new(first.width, first.height, sample, data)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/projection.rs"]
mod tests;

use serde_json::Value;
use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x5f3c_91d2_a4e7_0b68;

/// Stable fingerprint of an overlay configuration.
///
/// Two configurations that compare equal under [`deep_eq`] always share a fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ConfigFingerprint {
    pub(crate) hi: u64,
    pub(crate) lo: u64,
}

/// Deep structural equality on configuration values.
///
/// Numbers compare by numeric value, objects key by key, and arrays ignore order: equal length
/// and every element of each side has an equal counterpart on the other.
pub(crate) fn deep_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len()
                && x.iter().all(|v| y.iter().any(|w| deep_eq(v, w)))
                && y.iter().all(|w| x.iter().any(|v| deep_eq(v, w)))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| deep_eq(v, w)))
        }
        _ => false,
    }
}

pub(crate) fn fingerprint(v: &Value) -> ConfigFingerprint {
    let mut h = StableHasher::new();
    write_value(&mut h, v);
    h.finish()
}

fn write_value(h: &mut StableHasher, v: &Value) {
    match v {
        Value::Null => h.write_u8(0),
        Value::Bool(b) => {
            h.write_u8(1);
            h.write_u8(u8::from(*b));
        }
        Value::Number(n) => {
            h.write_u8(2);
            match n.as_f64() {
                // -0.0 == 0.0 numerically.
                Some(f) if f == 0.0 => h.write_u64(0),
                Some(f) => h.write_u64(f.to_bits()),
                None => h.write_bytes(n.to_string().as_bytes()),
            }
        }
        Value::String(s) => {
            h.write_u8(3);
            h.write_u64(s.len() as u64);
            h.write_bytes(s.as_bytes());
        }
        Value::Array(items) => {
            h.write_u8(4);
            h.write_u64(items.len() as u64);
            let mut elems: Vec<ConfigFingerprint> = items.iter().map(fingerprint).collect();
            elems.sort_by_key(|f| (f.hi, f.lo));
            elems.dedup();
            for f in elems {
                h.write_u64(f.hi);
                h.write_u64(f.lo);
            }
        }
        Value::Object(map) => {
            h.write_u8(5);
            h.write_u64(map.len() as u64);
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for k in keys {
                h.write_u64(k.len() as u64);
                h.write_bytes(k.as_bytes());
                write_value(h, &map[k.as_str()]);
            }
        }
    }
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn finish(self) -> ConfigFingerprint {
        let v = self.inner.digest128();
        ConfigFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/overlay/equality.rs"]
mod tests;

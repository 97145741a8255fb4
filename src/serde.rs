//! `serde` support for [`Vector`]s
//!
//! A `Vector` is represented as a plain sequence of its values; the shape of the tree isn't
//! preserved. Deserializing produces a fully packed tree.

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::{Serialize, Serializer};

use std::fmt;
use std::marker::PhantomData;

use crate::{Builder, Vector};

impl<T: Serialize> Serialize for Vector<T> {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<T: Serialize> Serialize for Builder<T> {
    fn serialize<Se: Serializer>(&self, serializer: Se) -> Result<Se::Ok, Se::Error> {
        Vector::serialize(self, serializer)
    }
}

impl<'de, T> Deserialize<'de> for Vector<T>
where
    T: Deserialize<'de> + Clone,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(VectorVisitor { marker: PhantomData })
    }
}

struct VectorVisitor<T> {
    marker: PhantomData<Vector<T>>,
}

impl<'de, T> Visitor<'de> for VectorVisitor<T>
where
    T: Deserialize<'de> + Clone,
{
    type Value = Vector<T>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a sequence of values")
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut builder = Builder::new();
        while let Some(value) = seq.next_element()? {
            builder.push(value);
        }

        Ok(builder.into_immutable())
    }
}

#[cfg(test)]
mod tests {
    use crate::Vector;

    #[test]
    fn json_round_trip() {
        let v: Vector<u32> = (0..100).collect();
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, serde_json::to_string(&(0..100).collect::<Vec<u32>>()).unwrap());

        let back: Vector<u32> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
        back.validate_packed();
    }

    #[test]
    fn builder_serializes_current_contents() {
        let mut b = Vector::new().to_builder();
        b.add_range(["a", "b", "c"]);
        b.remove_at(1).unwrap();
        assert_eq!(serde_json::to_string(&b).unwrap(), r#"["a","c"]"#);
    }

    #[test]
    fn empty_sequence() {
        let v: Vector<String> = serde_json::from_str("[]").unwrap();
        assert!(v.is_empty());
        assert!(v.ptr_eq(&Vector::new()));
    }
}

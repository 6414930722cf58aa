use serde::{Deserialize, Deserializer};

// Makes the difference between a field that's absent
// from the request body (outer None, thanks to
// #[serde(default)]) and a field explicitly set to
// null (Some(None)). To be used with:
// #[serde(default, deserialize_with = "serde_utils::deserialize_null_value")]
pub fn deserialize_null_value<'de, T, D>(
  deserializer: D
) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: Deserializer<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

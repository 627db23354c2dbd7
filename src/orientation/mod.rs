pub(crate) mod quantize;
pub(crate) mod transform;

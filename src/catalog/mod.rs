pub(crate) mod layout;
pub(crate) mod resources;
pub(crate) mod styles;

pub(crate) mod engine;
pub(crate) mod images;
pub(crate) mod intent;
pub(crate) mod layout_change;
pub(crate) mod pages;
pub(crate) mod titles;

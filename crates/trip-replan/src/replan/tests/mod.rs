mod common;
mod constraints;
mod routing;

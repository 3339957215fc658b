pub mod actions;
pub mod clock;
pub mod normalize;
pub mod project;
pub mod timeline;
pub mod view;

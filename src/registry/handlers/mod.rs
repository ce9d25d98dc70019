pub mod canvas;
pub mod common;
pub mod element;
pub mod history;
pub mod layer;
pub mod media;
pub mod project;
pub mod shape;
pub mod text;

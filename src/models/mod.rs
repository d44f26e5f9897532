pub mod news;

pub use news::{FieldErrors, NewsCreate, NewsOut, NewsUpdate};

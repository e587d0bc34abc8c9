mod episode;
mod show;

pub use episode::Episode;
pub use show::{Provider, Show, ShowMetadata};

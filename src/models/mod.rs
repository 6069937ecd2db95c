//! Data models for pagemill

pub mod article;

pub use article::{Article, ArticleStatus, StatusTransition};

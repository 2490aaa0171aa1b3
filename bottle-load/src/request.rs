//! Request payload construction

use crate::corpus::Corpus;
use bottle_http::HttpRequest;
use rand::Rng;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Categorical label attached to POST bodies and optionally to GET paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Theme {
    /// The empty theme; GETs go to `/poem`
    Unthemed,
    Love,
    Death,
    Nature,
    Beauty,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Unthemed,
        Theme::Love,
        Theme::Death,
        Theme::Nature,
        Theme::Beauty,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Unthemed => "",
            Theme::Love => "Love",
            Theme::Death => "Death",
            Theme::Nature => "Nature",
            Theme::Beauty => "Beauty",
        }
    }

    /// Uniformly sample a theme
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Theme {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Theme {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Builds POST and GET requests against one base URL
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: Arc<str>,
    corpus: Corpus,
}

impl RequestBuilder {
    pub fn new(base_url: &str, corpus: Corpus) -> Self {
        Self {
            base_url: Arc::from(base_url.trim_end_matches('/')),
            corpus,
        }
    }

    /// `POST {base}/sentence` with a random corpus line and theme
    pub fn build_post(&self, author: u64) -> HttpRequest {
        self.build_post_with(author, &mut rand::rng())
    }

    /// `GET {base}/poem` or `GET {base}/poem/{theme}` for a random theme
    pub fn build_get(&self) -> HttpRequest {
        self.build_get_with(&mut rand::rng())
    }

    pub fn build_post_with<R: Rng + ?Sized>(&self, author: u64, rng: &mut R) -> HttpRequest {
        let content = self.corpus.line(rng.random_range(0..self.corpus.len()));
        let theme = Theme::sample(rng);
        let body = serde_json::json!({
            "author": author,
            "content": content,
            "theme": theme,
        });
        HttpRequest::post_json(format!("{}/sentence", self.base_url), body.to_string())
    }

    pub fn build_get_with<R: Rng + ?Sized>(&self, rng: &mut R) -> HttpRequest {
        let url = match Theme::sample(rng) {
            Theme::Unthemed => format!("{}/poem", self.base_url),
            theme => format!("{}/poem/{}", self.base_url, theme),
        };
        HttpRequest::get(url)
    }
}

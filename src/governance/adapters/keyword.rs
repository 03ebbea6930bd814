//! Keyword-list classifier.

use crate::config::ClassifierConfig;
use crate::governance::ports::Classifier;
use crate::registry::domain::{RegistryDomainError, RepoName};

/// Case-insensitive substring classifier driven by configured vocabularies.
///
/// Repository buckets are checked in order and the first bucket with a
/// matching keyword wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordClassifier {
    heavy_terms: Vec<String>,
    buckets: Vec<(RepoName, Vec<String>)>,
}

impl KeywordClassifier {
    /// Builds a classifier from explicit vocabularies.
    #[must_use]
    pub fn new(heavy_terms: Vec<String>, buckets: Vec<(RepoName, Vec<String>)>) -> Self {
        Self {
            heavy_terms: lowercase_all(heavy_terms),
            buckets: buckets
                .into_iter()
                .map(|(repo, keywords)| (repo, lowercase_all(keywords)))
                .collect(),
        }
    }

    /// Builds a classifier from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryDomainError`] when a bucket names an invalid
    /// repository.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, RegistryDomainError> {
        let buckets = config
            .repo_buckets
            .iter()
            .map(|bucket| {
                RepoName::new(bucket.repo.as_str()).map(|repo| (repo, bucket.keywords.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(config.heavy_infrastructure_terms.clone(), buckets))
    }
}

fn lowercase_all(terms: Vec<String>) -> Vec<String> {
    terms
        .into_iter()
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

impl Classifier for KeywordClassifier {
    fn mentions(&self, text: &str, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        !needle.is_empty() && text.to_lowercase().contains(&needle)
    }

    fn heavy_infrastructure_terms(&self, solution: &str) -> Vec<String> {
        let haystack = solution.to_lowercase();
        self.heavy_terms
            .iter()
            .filter(|term| haystack.contains(term.as_str()))
            .cloned()
            .collect()
    }

    fn classify_repo(&self, description: &str) -> Option<RepoName> {
        let haystack = description.to_lowercase();
        self.buckets
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|keyword| haystack.contains(keyword.as_str()))
            })
            .map(|(repo, _)| repo.clone())
    }
}

//! Text intelligence options, serialized into the request query string.

use url::Url;

/// Options selecting which analyses to run on submitted text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOptions {
    /// Produce an abstractive summary.
    pub summarize: Option<bool>,
    /// Detect topics.
    pub topics: Option<bool>,
    /// Detect speaker intents.
    pub intents: Option<bool>,
    /// Score sentiment.
    pub sentiment: Option<bool>,
    /// BCP-47 language tag of the submitted text.
    pub language: Option<String>,
}

impl ReadOptions {
    /// Enable or disable summarization.
    pub fn with_summarize(mut self, summarize: bool) -> Self {
        self.summarize = Some(summarize);
        self
    }

    /// Enable or disable topic detection.
    pub fn with_topics(mut self, topics: bool) -> Self {
        self.topics = Some(topics);
        self
    }

    /// Enable or disable intent detection.
    pub fn with_intents(mut self, intents: bool) -> Self {
        self.intents = Some(intents);
        self
    }

    /// Enable or disable sentiment scoring.
    pub fn with_sentiment(mut self, sentiment: bool) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    /// Set the language tag.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// True when no analysis has been requested.
    pub(crate) fn is_empty(&self) -> bool {
        !self.summarize.unwrap_or(false)
            && !self.topics.unwrap_or(false)
            && !self.intents.unwrap_or(false)
            && !self.sentiment.unwrap_or(false)
    }

    /// Serialize the set options onto a request URL.
    pub(crate) fn append_query(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        if let Some(summarize) = self.summarize {
            pairs.append_pair("summarize", bool_str(summarize));
        }
        if let Some(topics) = self.topics {
            pairs.append_pair("topics", bool_str(topics));
        }
        if let Some(intents) = self.intents {
            pairs.append_pair("intents", bool_str(intents));
        }
        if let Some(sentiment) = self.sentiment {
            pairs.append_pair("sentiment", bool_str(sentiment));
        }
        if let Some(language) = &self.language {
            pairs.append_pair("language", language);
        }
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_of(options: &ReadOptions) -> String {
        let mut url = Url::parse("https://api.auricle.com/v1/read").unwrap();
        options.append_query(&mut url);
        url.query().unwrap_or_default().to_string()
    }

    #[test]
    fn test_query_serialization() {
        let options = ReadOptions::default()
            .with_summarize(true)
            .with_topics(true)
            .with_language("en");

        let query = query_of(&options);
        assert!(query.contains("summarize=true"));
        assert!(query.contains("topics=true"));
        assert!(query.contains("language=en"));
        assert!(!query.contains("sentiment"));
    }

    #[test]
    fn test_is_empty() {
        assert!(ReadOptions::default().is_empty());
        assert!(ReadOptions::default().with_summarize(false).is_empty());
        assert!(!ReadOptions::default().with_sentiment(true).is_empty());
    }
}

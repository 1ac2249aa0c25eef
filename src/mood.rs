//! Mood trend derived from classified assistant turns
//!
//! The aggregator is a pure function of the sample sequence plus a cache of
//! the last computed display value, recomputed on append, hydrate and clear.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Sentiment tag attached to a classified exchange.
///
/// The classifier vocabulary is open-ended on the wire; tags outside the
/// known palette are carried through verbatim and rendered with the neutral
/// color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentiment {
    Happy,
    Sad,
    Angry,
    Anxious,
    Excited,
    Neutral,
    Overwhelmed,
    Other(String),
}

impl Sentiment {
    /// Display color for this tag, as RGB.
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            Sentiment::Happy => (0xff, 0xd6, 0x00),
            Sentiment::Sad => (0x19, 0x76, 0xd2),
            Sentiment::Angry => (0xff, 0x70, 0x43),
            Sentiment::Anxious => (0xba, 0x68, 0xc8),
            Sentiment::Excited => (0x00, 0xe6, 0x76),
            Sentiment::Overwhelmed => (0xff, 0xb3, 0x00),
            Sentiment::Neutral | Sentiment::Other(_) => (0xbd, 0xbd, 0xbd),
        }
    }
}

impl FromStr for Sentiment {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "happy" => Sentiment::Happy,
            "sad" => Sentiment::Sad,
            "angry" => Sentiment::Angry,
            "anxious" => Sentiment::Anxious,
            "excited" => Sentiment::Excited,
            "neutral" => Sentiment::Neutral,
            "overwhelmed" => Sentiment::Overwhelmed,
            _ => Sentiment::Other(s.to_string()),
        })
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Happy => write!(f, "happy"),
            Sentiment::Sad => write!(f, "sad"),
            Sentiment::Angry => write!(f, "angry"),
            Sentiment::Anxious => write!(f, "anxious"),
            Sentiment::Excited => write!(f, "excited"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Overwhelmed => write!(f, "overwhelmed"),
            Sentiment::Other(tag) => write!(f, "{tag}"),
        }
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        // Parsing is infallible: unknown tags become Other.
        Ok(tag.parse().unwrap_or(Sentiment::Other(tag)))
    }
}

/// One classified exchange: the tag plus the classifier's confidence in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSample {
    pub sentiment: Sentiment,
    pub confidence: f32,
}

impl MoodSample {
    pub fn new(sentiment: Sentiment, confidence: f32) -> Self {
        Self {
            sentiment,
            confidence,
        }
    }
}

/// Current mood readout for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodDisplay {
    pub label: String,
    pub confidence: f32,
    pub color: (u8, u8, u8),
}

/// The ordered sequence of mood samples, append-only from the client's
/// perspective (a full replace happens only on clear or hydrate).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoodTrend {
    samples: Vec<MoodSample>,
    current: Option<MoodDisplay>,
}

impl MoodTrend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample from a freshly completed exchange.
    pub fn push(&mut self, sample: MoodSample) {
        self.samples.push(sample);
        self.recompute();
    }

    /// Replace the whole sequence (hydrate).
    pub fn replace(&mut self, samples: Vec<MoodSample>) {
        self.samples = samples;
        self.recompute();
    }

    /// Drop every sample (clear).
    pub fn clear(&mut self) {
        self.samples.clear();
        self.recompute();
    }

    /// The cached display value for the most recent sample.
    pub fn current(&self) -> Option<&MoodDisplay> {
        self.current.as_ref()
    }

    #[allow(dead_code)] // State query utility
    pub fn samples(&self) -> &[MoodSample] {
        &self.samples
    }

    #[allow(dead_code)] // State query utility
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[allow(dead_code)] // State query utility
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn recompute(&mut self) {
        self.current = self.samples.last().map(|sample| MoodDisplay {
            label: sample.sentiment.to_string(),
            confidence: sample.confidence,
            color: sample.sentiment.color(),
        });
    }
}

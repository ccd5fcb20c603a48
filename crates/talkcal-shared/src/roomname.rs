//! Room slug generation.
//!
//! Slugs are CamelCase phrases without separators, e.g.
//! `QuietOttersGatherSoftly`, so they survive being embedded in free text
//! and extracted again by the resolver.

use std::collections::HashSet;

use rand::rngs::ThreadRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::types::MeetingId;

/// Produces a fresh room identifier on demand.
pub trait RoomUrlGenerator {
    fn generate(&mut self) -> MeetingId;
}

const ADJECTIVES: &[&str] = &[
    "Quiet", "Brave", "Silver", "Gentle", "Rapid", "Golden", "Hidden", "Lucky", "Mellow",
    "Nimble", "Proud", "Rustic", "Sunny", "Tidy", "Vivid", "Witty", "Bold", "Calm", "Eager",
    "Frosty", "Jolly", "Misty", "Noble", "Polite",
];

const PLURAL_NOUNS: &[&str] = &[
    "Otters", "Falcons", "Maples", "Rivers", "Comets", "Lanterns", "Harbors", "Meadows",
    "Pebbles", "Sparrows", "Tigers", "Violins", "Willows", "Anchors", "Beacons", "Cedars",
    "Dolphins", "Embers", "Foxes", "Glaciers", "Islands", "Kettles", "Ladders", "Orchards",
];

const VERBS: &[&str] = &[
    "Gather", "Wander", "Whisper", "Travel", "Sparkle", "Listen", "Balance", "Carry", "Dance",
    "Explore", "Follow", "Glow", "Hover", "Imagine", "Juggle", "Linger", "Meet", "Notice",
    "Paddle", "Rally", "Settle", "Thrive", "Unite", "Wonder",
];

const ADVERBS: &[&str] = &[
    "Softly", "Boldly", "Calmly", "Daily", "Eagerly", "Freely", "Gladly", "Happily", "Kindly",
    "Lightly", "Merrily", "Neatly", "Openly", "Promptly", "Quickly", "Rarely", "Safely",
    "Swiftly", "Truly", "Warmly", "Wisely", "Gently", "Brightly", "Proudly",
];

/// Give up on unique phrases after this many collisions and add digits.
const MAX_PHRASE_ATTEMPTS: usize = 16;

/// Word-list generator that never repeats a slug within its lifetime.
pub struct WordlistGenerator<R: Rng = ThreadRng> {
    rng: R,
    issued: HashSet<String>,
}

impl WordlistGenerator<ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for WordlistGenerator<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> WordlistGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            issued: HashSet::new(),
        }
    }

    /// Number of slugs handed out so far.
    pub fn issued_count(&self) -> usize {
        self.issued.len()
    }

    fn phrase(&mut self) -> String {
        let mut phrase = String::new();
        for list in [ADJECTIVES, PLURAL_NOUNS, VERBS, ADVERBS] {
            if let Some(word) = list.choose(&mut self.rng) {
                phrase.push_str(word);
            }
        }
        phrase
    }
}

impl<R: Rng> RoomUrlGenerator for WordlistGenerator<R> {
    fn generate(&mut self) -> MeetingId {
        for _ in 0..MAX_PHRASE_ATTEMPTS {
            let candidate = self.phrase();
            if self.issued.insert(candidate.clone()) {
                return MeetingId(candidate);
            }
        }

        loop {
            let candidate = format!("{}{}", self.phrase(), self.rng.gen_range(1000..10_000));
            if self.issued.insert(candidate.clone()) {
                return MeetingId(candidate);
            }
        }
    }
}

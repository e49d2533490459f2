//! Call-to-action phrase pools.

use rand::Rng;
use rand::seq::SliceRandom;

/// Longest short CTA rendered on a story
pub const MAX_SHORT_CTA_CHARS: usize = 25;

/// Used for prime slots and HIGH priority collections
pub const HIGH_PRIORITY_CTAS: [&str; 7] = [
    "Get yours",
    "Don't miss out",
    "Limited stock",
    "I want it now!",
    "Go see it",
    "Limited edition",
    "Buy now",
];

pub const STANDARD_CTAS: [&str; 7] = [
    "See details",
    "Link in bio",
    "Check the site",
    "See the collection",
    "Come take a look",
    "Visit the store",
    "Learn more",
];

/// Drawn independently of priority
pub const COMMERCIAL_CTAS: [&str; 14] = [
    "GET YOURS RIGHT NOW",
    "TAP THE LINK IN BIO",
    "ALMOST SOLD OUT",
    "BUY BEFORE IT'S GONE",
    "WE SHIP NATIONWIDE",
    "INTEREST-FREE INSTALLMENTS",
    "VISIT OUR SITE NOW",
    "SEE THE DETAILS HERE",
    "NEW IN THE ONLINE STORE",
    "AVAILABLE NOW ONLINE",
    "ORDER YOUR EXCLUSIVE PIECE",
    "USE THE DISCOUNT CODE",
    "NEW COLLECTION ONLINE",
    "MORE PHOTOS ON THE SITE",
];

/// Short CTA: uppercased, at most 25 characters
pub fn short_cta<R: Rng + ?Sized>(urgent: bool, rng: &mut R) -> String {
    let pool: &[&str] = if urgent {
        &HIGH_PRIORITY_CTAS
    } else {
        &STANDARD_CTAS
    };
    let phrase = pool.choose(rng).copied().unwrap_or_default();
    phrase.to_uppercase().chars().take(MAX_SHORT_CTA_CHARS).collect()
}

pub fn commercial_cta<R: Rng + ?Sized>(rng: &mut R) -> String {
    COMMERCIAL_CTAS
        .choose(rng)
        .copied()
        .unwrap_or_default()
        .to_string()
}

/// Redraw the commercial CTA until it differs from `current`
pub fn regenerate_commercial<R: Rng + ?Sized>(current: &str, rng: &mut R) -> String {
    loop {
        let candidate = commercial_cta(rng);
        if candidate != current {
            return candidate;
        }
    }
}

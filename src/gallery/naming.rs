//! Derived names and blob paths for stored images.

use crate::gallery::ImageType;
use rand::seq::SliceRandom;
use rand::Rng;
use std::path::Path;

/// Marker appended to the stem of every primary asset
pub const FULLSIZE_MARKER: &str = "_fullsize";

/// Marker appended to the stem of every preview asset
pub const PREVIEW_MARKER: &str = "_preview";

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Amara", "Beatriz", "Carlos", "Chen", "Dmitri", "Elena", "Farah", "Grace",
    "Hiro", "Ines", "Jamal", "Kofi", "Lena", "Mateo", "Nadia", "Omar", "Priya", "Quinn",
    "Rosa", "Sven", "Tariq", "Uma", "Viktor", "Wei", "Yara", "Zoe",
];

const LAST_NAMES: &[&str] = &[
    "Abbott", "Baker", "Castillo", "D'Souza", "Eriksen", "Fischer", "Garcia", "Hughes",
    "Ivanova", "Jensen", "Kowalski", "Lopez", "Moreau", "Nakamura", "O'Brien", "Patel",
    "Quintero", "Rossi", "Schmidt", "Tanaka", "Usman", "Van Dijk", "Walsh", "Xu", "Young",
    "Zielinski",
];

/// Lowercase ASCII slug: alphanumerics kept, runs of anything else collapse to `-`
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_dash = false;

    for c in value.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c != '\'' {
            // apostrophes vanish: O'Brien -> obrien
            pending_dash = true;
        }
    }

    slug
}

/// A random, human-looking name slug such as `grace-nakamura`
pub fn random_human_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES.choose(rng).copied().unwrap_or("anonymous");
    let last = LAST_NAMES.choose(rng).copied().unwrap_or("human");
    slugify(&format!("{} {}", first, last))
}

/// `images/{type}/{name}/{name}_fullsize.jpg`
pub fn primary_path(image_type: ImageType, name: &str) -> String {
    format!(
        "images/{}/{name}/{name}{}.jpg",
        image_type.as_str(),
        FULLSIZE_MARKER,
        name = name
    )
}

/// `images/{type}/{title}/{title}_preview.jpg`
pub fn preview_path(image_type: ImageType, title: &str) -> String {
    format!(
        "images/{}/{title}/{title}{}.jpg",
        image_type.as_str(),
        PREVIEW_MARKER,
        title = title
    )
}

/// Filename stem of `path` with a trailing `_fullsize` marker removed
pub fn title_from_path(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match stem.strip_suffix(FULLSIZE_MARKER) {
        Some(title) => title.to_string(),
        None => stem,
    }
}

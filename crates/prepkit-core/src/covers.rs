//! Interview cover images.

use rand::seq::IndexedRandom;

const INTERVIEW_COVERS: &[&str] = &[
    "adobe",
    "amazon",
    "facebook",
    "hostinger",
    "pinterest",
    "quora",
    "reddit",
    "skype",
    "spotify",
    "telegram",
    "tiktok",
    "yahoo",
];

/// Pick a cover image path at random, e.g. `/covers/spotify.png`.
pub fn random_interview_cover() -> String {
    let name = INTERVIEW_COVERS
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("adobe");
    format!("/covers/{name}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_is_known() {
        for _ in 0..32 {
            let cover = random_interview_cover();
            let name = cover
                .strip_prefix("/covers/")
                .and_then(|c| c.strip_suffix(".png"))
                .unwrap();
            assert!(INTERVIEW_COVERS.contains(&name), "unexpected cover {cover}");
        }
    }
}

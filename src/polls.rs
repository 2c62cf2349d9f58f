//! The daily poll question pool.

use rand::RngCore;
use rand::seq::IndexedRandom;

/// Answer options on every poll.
pub const OPTION_COUNT: usize = 7;

/// A question with seven hour buckets, lightest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTemplate {
    pub question: &'static str,
    pub options: [&'static str; OPTION_COUNT],
}

pub static TEMPLATES: [PollTemplate; 18] = [
    PollTemplate {
        question: "How many study hours did you hit today? ⏳",
        options: [
            "0h (Rest day) 😴",
            "1-3h (Good start) 💡",
            "3-6h (Solid work) 🔨",
            "6-8h (Impressive) 🔥",
            "8-10h (Beast mode) ⚡",
            "10-12h (Legend) 🚀",
            "12h+ (Unstoppable) 👑",
        ],
    },
    PollTemplate {
        question: "Deep Work hours today? 🧠",
        options: [
            "0h (Recharge) 📵",
            "1-3h (Building habit) 🌱",
            "3-6h (Locked in) 🔒",
            "6-8h (Flow state) 🌊",
            "8-10h (Academic weapon) ⚔️",
            "10-12h (Genius level) 💎",
            "12h+ (Superhuman) 🏆",
        ],
    },
    PollTemplate {
        question: "Total focused study time? ⏱️",
        options: [
            "0h (Off day) 💀",
            "1-3h (Progress made) 🕐",
            "3-6h (Consistent) 🕒",
            "6-8h (Dedicated) 🕓",
            "8-10h (Committed) 🕔",
            "10-12h (Elite focus) 🕕",
            "12h+ (God tier) 🕛",
        ],
    },
    PollTemplate {
        question: "Productive study hours today? 🤥",
        options: [
            "0h (Honest rest) 😅",
            "1-3h (Small wins) 👍",
            "3-6h (Strong effort) 💪",
            "6-8h (Fire output) 🔥",
            "8-10h (Crushing it) ⚡",
            "10-12h (Champion) 🎯",
            "12h+ (Absolute legend) 💯",
        ],
    },
    PollTemplate {
        question: "Actual study time (be honest)? 📊",
        options: [
            "0h (Recovery) 🤡",
            "1-3h (Starting strong) 🐌",
            "3-6h (Solid grind) 🆗",
            "6-8h (Intense work) 😤",
            "8-10h (Peak performance) 🥵",
            "10-12h (Unmatched) 🦾",
            "12h+ (Next level) 🧠",
        ],
    },
    PollTemplate {
        question: "Study hours grinded today? 📝",
        options: [
            "0h (Break day) 🏖️",
            "1-3h (Good effort) 📖",
            "3-6h (Making moves) ✍️",
            "6-8h (Serious grind) 🔄",
            "8-10h (Dominating) 🧹",
            "10-12h (Scholar mode) 📚",
            "12h+ (Certified genius) 🎓",
        ],
    },
    PollTemplate {
        question: "How long did you study? ⏳",
        options: [
            "0h (Chill day) 💤",
            "1-3h (Early bird) 🌅",
            "3-6h (Day warrior) ☀️",
            "6-8h (Evening grinder) 🌆",
            "8-10h (Night owl) 🌃",
            "10-12h (Full cycle) 🌌",
            "12h+ (Time bender) ✨",
        ],
    },
    PollTemplate {
        question: "Study session duration today? ⌚",
        options: [
            "0h (Resting) 🛌",
            "1-3h (Walking forward) 🚶",
            "3-6h (Running hard) 🏃",
            "6-8h (Cycling through) 🚴",
            "8-10h (Lifting heavy) 🏋️",
            "10-12h (Superhero) 🦸",
            "12h+ (Titan status) 🔱",
        ],
    },
    PollTemplate {
        question: "Time spent studying? 📖",
        options: [
            "0h (Pause) 😶",
            "1-3h (Writing history) 📝",
            "3-6h (Page turner) 📕",
            "6-8h (Book master) 📗",
            "8-10h (Knowledge seeker) 📘",
            "10-12h (Wisdom holder) 📙",
            "12h+ (Library itself) 📚",
        ],
    },
    PollTemplate {
        question: "Today's study grind hours? 💪",
        options: [
            "0h (Smile break) 🫠",
            "1-3h (Happy start) 🙂",
            "3-6h (Cheerful grind) 😊",
            "6-8h (Grinning wide) 😁",
            "8-10h (Star struck) 🤩",
            "10-12h (Cool cat) 😎",
            "12h+ (Gold medalist) 🥇",
        ],
    },
    PollTemplate {
        question: "Hours of focused work? 🎯",
        options: [
            "0h (Float day) 🎈",
            "1-3h (Big tent) 🎪",
            "3-6h (Artist) 🎨",
            "6-8h (Performer) 🎭",
            "8-10h (Director) 🎬",
            "10-12h (Bullseye) 🎯",
            "12h+ (Trophy hunter) 🏅",
        ],
    },
    PollTemplate {
        question: "Study time tracker? ⏲️",
        options: [
            "0h (Stop) 🟥",
            "1-3h (Warming up) 🟧",
            "3-6h (Caution ready) 🟨",
            "6-8h (Go green) 🟩",
            "8-10h (Blue sky) 🟦",
            "10-12h (Purple reign) 🟪",
            "12h+ (All colors) 🟫",
        ],
    },
    PollTemplate {
        question: "How much did you grind? 🔥",
        options: [
            "0h (Ice cool) 🧊",
            "1-3h (Temperature rising) 🌡️",
            "3-6h (Temperature rising) 🌡️",
            "6-8h (Spicy hot) 🌶️",
            "8-10h (On fire) 🔥",
            "10-12h (Volcano) 🌋",
            "12h+ (Literal sun) ☀️",
        ],
    },
    PollTemplate {
        question: "Study hours completed? ✅",
        options: [
            "0h (Marked off) ❌",
            "1-3h (Started) ⬜",
            "3-6h (Yellow flag) 🟨",
            "6-8h (Orange zone) 🟧",
            "8-10h (Green light) 🟩",
            "10-12h (Blue ribbon) 🟦",
            "12h+ (Purple heart) 🟪",
        ],
    },
    PollTemplate {
        question: "Grind time today? ⚡",
        options: [
            "0h (Battery rest) 🪫",
            "1-3h (Charging up) 🔋",
            "3-6h (Plugged in) 🔌",
            "6-8h (Electric) ⚡",
            "8-10h (Lightning) 🌩️",
            "10-12h (Thunderstorm) ⛈️",
            "12h+ (Tornado force) 🌪️",
        ],
    },
    PollTemplate {
        question: "How many hours studied? 📚",
        options: [
            "0h (Chill mode) 🌴",
            "1-3h (Baby steps) 👶",
            "3-6h (Growing strong) 🌿",
            "6-8h (Blooming) 🌸",
            "8-10h (Full bloom) 🌺",
            "10-12h (Garden master) 🌻",
            "12h+ (Forest legend) 🌳",
        ],
    },
    PollTemplate {
        question: "Study duration check? 🎓",
        options: [
            "0h (No cap) 🧢",
            "1-3h (Rookie gains) 🏃‍♂️",
            "3-6h (Pro moves) 🏋️‍♂️",
            "6-8h (Expert level) 🥷",
            "8-10h (Master class) 🧙",
            "10-12h (Sensei status) 🥋",
            "12h+ (Final boss) 👹",
        ],
    },
    PollTemplate {
        question: "Total grind hours? 💎",
        options: [
            "0h (Stone) 🪨",
            "1-3h (Bronze) 🥉",
            "3-6h (Silver) 🥈",
            "6-8h (Gold) 🥇",
            "8-10h (Platinum) 💿",
            "10-12h (Diamond) 💎",
            "12h+ (Unranked legend) 👑",
        ],
    },
];

/// Pick today's template at random.
pub fn choose(rng: &mut dyn RngCore) -> &'static PollTemplate {
    TEMPLATES.choose(rng).unwrap_or(&TEMPLATES[0])
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn every_template_has_qualifying_buckets() {
        for template in &TEMPLATES {
            assert!(template.options[5].starts_with("10-12h"), "{}", template.question);
            assert!(template.options[6].starts_with("12h+"), "{}", template.question);
            assert!(template.options[0].starts_with("0h"), "{}", template.question);
        }
    }

    #[test]
    fn options_fit_poll_limits() {
        for template in &TEMPLATES {
            assert!(template.question.chars().count() <= 300);
            for option in template.options {
                assert!(!option.is_empty() && option.chars().count() <= 100);
            }
        }
    }

    #[test]
    fn choose_is_deterministic_for_a_seed() {
        let a = choose(&mut StdRng::seed_from_u64(42));
        let b = choose(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}

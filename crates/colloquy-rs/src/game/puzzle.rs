//! Puzzles and role definitions.
//!
//! All prompt text here is configuration data, not behavior: a session can
//! run with any puzzle and any cast, and nothing else in the crate reads
//! the wording. The built-in library and default cast reproduce the
//! classic "turtle soup" table: one host who knows the solution and three
//! players with distinct reasoning styles.

/// Name under which the arbiter speaks in the shared transcript.
pub const ARBITER_NAME: &str = "Host";

/// A lateral-thinking puzzle: a public story and a private solution.
#[derive(Debug, Clone)]
pub struct Puzzle {
    pub title: String,
    pub story: String,
    pub solution: String,
}

impl Puzzle {
    pub fn new(
        title: impl Into<String>,
        story: impl Into<String>,
        solution: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            story: story.into(),
            solution: solution.into(),
        }
    }
}

/// A named player role: who they are and how they reason.
#[derive(Debug, Clone)]
pub struct RoleSpec {
    pub name: String,
    pub instruction: String,
}

impl RoleSpec {
    pub fn new(name: impl Into<String>, instruction: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
        }
    }
}

/// The arbiter's fixed behavioral instruction, with the solution baked in.
///
/// The confirmation wording in rule 4 is coupled to the phrase list the
/// scheduler scans for; changing one means changing the other.
pub fn arbiter_instruction(puzzle: &Puzzle) -> String {
    format!(
        "You are the host of a lateral-thinking deduction game. You know the \
         complete solution, but the players must reconstruct it through yes/no \
         questions.\n\n\
         THE SOLUTION (known only to you):\n{}\n\n\
         Your rules:\n\
         1. When a player asks you a question, answer only with one of: \
         \"Yes.\" / \"No.\" / \"Irrelevant.\" / \"That is an important question.\"\n\
         2. Never volunteer key details of the solution.\n\
         3. If the players are close, you may say \"you are on the right track\".\n\
         4. Only when a player states the full solution, reply with \
         \"That is completely correct — you solved it.\" and recount the answer.\n\
         5. Keep every reply short so the players keep reasoning.\n\n\
         You answer direct questions only; you do not join the discussion.",
        puzzle.solution
    )
}

/// The built-in puzzle library.
pub fn builtin_puzzles() -> Vec<Puzzle> {
    vec![
        Puzzle::new(
            "Turtle Soup",
            "A man orders a bowl of turtle soup at a restaurant, takes one sip, \
             and kills himself. Why?",
            "Years ago the man was shipwrecked with a companion. To keep him \
             alive, the companion secretly fed him his own flesh, calling it \
             turtle soup. Tasting real turtle soup for the first time, the man \
             realizes what his companion sacrificed, and the guilt destroys him.",
        ),
        Puzzle::new(
            "The Dark House",
            "A woman comes home late at night and finds every light in the house \
             off. The moment she switches one on, she bursts into tears. Why?",
            "She is a lighthouse keeper. Coming home, she realizes she forgot to \
             light the lighthouse lamp; while it stood dark, a ship struck the \
             rocks and sank. Turning on her own light makes her understand what \
             happened.",
        ),
        Puzzle::new(
            "The Elevator",
            "A short man rides the elevator to the 15th floor every sunny day and \
             walks the stairs to the 20th, but on rainy days he rides straight to \
             the 20th. Why?",
            "The man is too short to reach the button for the 20th floor, so he \
             presses 15 and walks the rest. On rainy days he carries an umbrella \
             and uses it to press the top button.",
        ),
        Puzzle::new(
            "The Midnight Call",
            "A man answers the phone in the middle of the night, hears a single \
             \"hello\", hangs up, and later kills himself. Why?",
            "The man is blind; his wife has lain in a coma for years, and he \
             phones the hospital nightly so a nurse can hold the receiver to her \
             ear. That night his wife woke and answered herself. Thinking it a \
             prank, he hung up; believing herself abandoned, she took her own \
             life, and on learning the truth he followed.",
        ),
    ]
}

/// The default three-player cast.
pub fn default_cast() -> Vec<RoleSpec> {
    vec![
        RoleSpec::new(
            "Sherlock",
            "You are Sherlock, a detective who reasons from concrete facts.\n\
             - Work by elimination: pin down one detail at a time.\n\
             - Summarize what the group has already established before adding to it.\n\
             - Speak calmly and precisely; phrases like \"From the facts so far...\" \
             suit you.\n\
             You are cooperating with the other players to reconstruct the hidden \
             story behind the host's puzzle.",
        ),
        RoleSpec::new(
            "Conan",
            "You are Conan, an intuitive leaps-first thinker.\n\
             - Offer bold hypotheses, even strange ones; sudden flashes of insight \
             are your strength.\n\
             - React to the other players' ideas with energy: \"Wait — what if...\"\n\
             - When a hunch feels strong, test it with a direct question.\n\
             You are cooperating with the other players to reconstruct the hidden \
             story behind the host's puzzle.",
        ),
        RoleSpec::new(
            "Poirot",
            "You are Poirot, the synthesizer of the table.\n\
             - Listen to the other players, weigh their theories against each \
             other, and name the single question that would advance the case most.\n\
             - Keep the group from chasing details the host has called irrelevant.\n\
             - Speak with measured confidence: \"Taking everything together...\"\n\
             You are cooperating with the other players to reconstruct the hidden \
             story behind the host's puzzle.",
        ),
    ]
}

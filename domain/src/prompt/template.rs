//! Prompt templates for the experiment flow

use crate::deliberation::memory::{MemoryEntry, OTHERS_HEADER, SITUATION_HEADER, STRATEGY_HEADER};
use crate::deliberation::transcript::TranscriptEntry;
use crate::economics::distribution::IncomeDistribution;
use crate::principle::choice::Principle;

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt establishing a participant's identity
    pub fn participant_system(name: &str, persona: &str) -> String {
        format!(
            r#"You are {}. {}

You are taking part in an experiment about distributive justice. Behind a veil of ignorance,
you do not know which income class you will be assigned to. The group's choice of principle
decides which income distribution applies, and your real payout depends on your assigned class.
Speak in the first person and stay in character."#,
            name,
            persona.trim()
        )
    }

    /// Numbered list of the four principles
    pub fn principles_overview() -> String {
        let mut text = String::from("The principles of justice:\n");
        for principle in Principle::ALL {
            text.push_str(&format!("{}\n", principle));
        }
        text.push_str(
            "Principle 3 needs a floor amount (minimum income). Principle 4 needs a range amount (maximum gap between highest and lowest income).",
        );
        text
    }

    pub fn distributions_overview(distributions: &[IncomeDistribution]) -> String {
        let lines: Vec<String> = distributions
            .iter()
            .map(|d| format!("- {}", d.describe()))
            .collect();
        format!("Candidate income distributions:\n{}", lines.join("\n"))
    }

    fn notes_block(notes: &[String]) -> String {
        if notes.is_empty() {
            return String::new();
        }
        let lines: Vec<String> = notes.iter().map(|n| format!("- {}", n)).collect();
        format!("\n\nYour private notes:\n{}", lines.join("\n"))
    }

    /// Round 0: the participant's first private assessment
    pub fn initial_assessment(distributions: &[IncomeDistribution]) -> String {
        format!(
            r#"{}

{}

Before any discussion, which principle do you consider most just, and why?
State the principle number clearly, and the amount if you choose principle 3 or 4."#,
            Self::principles_overview(),
            Self::distributions_overview(distributions)
        )
    }

    /// One private individual round with real payout consequences
    pub fn individual_round(
        round_number: u32,
        distributions: &[IncomeDistribution],
        notes: &[String],
    ) -> String {
        format!(
            r#"Individual round {}.

{}

{}{}

Choose one principle for yourself. The distribution it selects will be applied to you,
and you will be paid according to the income class you are assigned.
State the principle number clearly, and the amount if you choose principle 3 or 4."#,
            round_number,
            Self::principles_overview(),
            Self::distributions_overview(distributions),
            Self::notes_block(notes)
        )
    }

    /// Single-call memory synthesis with structured headers
    pub fn memory_synthesis(
        round_number: u32,
        previous: &[MemoryEntry],
        public_context: &str,
    ) -> String {
        let previous_text = if previous.is_empty() {
            "(no earlier notes)".to_string()
        } else {
            previous
                .iter()
                .map(MemoryEntry::render)
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            r#"Group discussion, round {}. Update your private memory before you speak.

Your earlier notes:
{}

Discussion so far:
{}

Reply in exactly three sections:
{} where the discussion stands and how close the group is to agreement
{} what the other participants want and why
{} what you will do in your next statement"#,
            round_number,
            previous_text,
            public_context,
            SITUATION_HEADER,
            OTHERS_HEADER,
            STRATEGY_HEADER
        )
    }

    /// Decomposed memory, step 1: factual recap
    pub fn memory_recap(recent_utterances: &[TranscriptEntry]) -> String {
        format!(
            r#"Summarize factually what was said in these recent statements.
Do not interpret or give your opinion.

{}"#,
            Self::format_entries(recent_utterances)
        )
    }

    /// Decomposed memory, step 2: focused analysis of one other participant
    pub fn memory_analysis(recap: &str, other: &TranscriptEntry) -> String {
        format!(
            r#"Recap of the discussion:
{}

Focus on {} only. They last said:
"{}"

What do they want, and what argument might move them?"#,
            recap, other.participant_id, other.utterance
        )
    }

    /// Decomposed memory, step 3: one concrete next action
    pub fn memory_action(recap: &str, analysis: &str) -> String {
        format!(
            r#"Recap of the discussion:
{}

Your analysis of another participant:
{}

Name ONE concrete thing you will do in your next statement."#,
            recap, analysis
        )
    }

    /// A public turn in group deliberation
    pub fn deliberation_turn(
        round_number: u32,
        speaking_position: usize,
        memory: &str,
        public_context: &str,
        notes: &[String],
    ) -> String {
        format!(
            r#"Group discussion, round {}. You are speaker number {}.

{}

Your private memory:
{}

Discussion so far:
{}{}

Make your statement to the group. The group must agree unanimously on one principle.
End by stating which principle you currently support (and the amount for principle 3 or 4)."#,
            round_number,
            speaking_position + 1,
            Self::principles_overview(),
            memory,
            public_context,
            Self::notes_block(notes)
        )
    }

    /// System prompt for the choice extractor
    pub fn extraction_system() -> &'static str {
        r#"You extract structured data from statements.
Reply with only the number of the principle the speaker supports (1, 2, 3 or 4).
If it is principle 3 or 4, follow the number with the dollar amount they named, e.g. "3 $13,000".
Do not add any other text."#
    }

    pub fn extraction(statement: &str) -> String {
        format!(
            "{}\n\nStatement:\n\"{}\"",
            Self::principles_overview(),
            statement
        )
    }

    /// System prompt for the round summarizer
    pub fn summary_system() -> &'static str {
        r#"You are a neutral note-taker for a group discussion.
Summarize what each speaker argued and which principle they support, in a few sentences."#
    }

    pub fn round_summary(round_number: u32, entries: &[TranscriptEntry]) -> String {
        format!(
            "Summarize round {} of the discussion:\n\n{}",
            round_number,
            Self::format_entries(entries)
        )
    }

    /// Private vote after deliberation ended without unanimity
    pub fn secret_ballot(notes: &[String]) -> String {
        format!(
            r#"The discussion has ended without unanimous agreement. You now cast a secret ballot.

{}{}

If every ballot names the same principle, it will be applied to the group.
State the principle number clearly, and the amount if you choose principle 3 or 4."#,
            Self::principles_overview(),
            Self::notes_block(notes)
        )
    }

    pub fn final_assessment(outcome: &str, notes: &[String]) -> String {
        format!(
            r#"The experiment is over. {}{}

Looking back, which principle do you now consider most just, and why?
State the principle number clearly."#,
            outcome,
            Self::notes_block(notes)
        )
    }

    /// Transcript entries as `[round N] id: utterance` lines
    pub fn format_entries(entries: &[TranscriptEntry]) -> String {
        if entries.is_empty() {
            return "(nothing has been said yet)".to_string();
        }
        entries
            .iter()
            .map(|e| {
                format!(
                    "[round {}] {}: {}",
                    e.round_number, e.participant_id, e.utterance
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

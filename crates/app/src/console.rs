use std::io::{self, Write};

use quiz_core::model::{Question, ResultDetail, ResultSummary};
use services::{QuestionReview, QuizProgress, QuizSummary};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-oriented stdin reader.
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Print `label` and read one trimmed line; `None` on end of input.
    pub async fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        print!("{label}");
        io::stdout().flush()?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_owned()))
    }

    /// `y`/`n` question; end of input counts as no.
    pub async fn confirm(&mut self, label: &str) -> io::Result<bool> {
        loop {
            match self.ask(&format!("{label} [y/n] ")).await? {
                None => return Ok(false),
                Some(answer) => match answer.to_ascii_lowercase().as_str() {
                    "y" | "yes" | "s" | "sim" => return Ok(true),
                    "n" | "no" | "não" | "nao" => return Ok(false),
                    _ => println!("Please answer y or n."),
                },
            }
        }
    }
}

pub fn question(question: &Question, progress: &QuizProgress) {
    println!();
    println!(
        "Question {}/{}  ·  {}  ·  answered {}",
        progress.position,
        progress.total,
        question.code(),
        progress.answered
    );
    println!("{}", question.statement());
    if let Some(url) = question.image_url() {
        println!("[image: {url}]");
    }
    for (key, text) in question.alternatives() {
        let marker = if progress.selected.as_deref() == Some(key.as_str()) {
            '*'
        } else {
            ' '
        };
        println!(" {marker}({key}) {text}");
    }
}

pub fn summary(summary: &QuizSummary) {
    let score = summary.score();
    println!();
    println!(
        "Score: {score}  ({}%, {})",
        summary.percentage(),
        score.band()
    );
    println!("{:<4} {:<8} {:<8} result", "#", "given", "key");
    for row in summary.rows() {
        let mark = if row.is_correct() { "✅" } else { "❌" };
        println!(
            "{:<4} {:<8} {:<8} {mark}",
            row.slot.number(),
            row.answer.given_answer,
            row.answer.answer_key
        );
        println!("     {}", row.answer.statement);
    }
}

pub fn result_line(index: usize, result: &ResultSummary) {
    println!(
        "{:>3}. {} {} · grade {} · {}/{} · {:.0}% ({}) · {} · id {}",
        index + 1,
        result.subject.emoji(),
        result.subject.display_name(),
        result.grade,
        result.correct,
        result.total,
        result.percentage,
        result.band(),
        result.created_at.format("%d/%m/%Y %H:%M"),
        result.id
    );
}

pub fn result_detail(detail: &ResultDetail) {
    let score = detail.recomputed_score();
    println!(
        "{} {} · grade {} · {} ({}%, {}) · {}",
        detail.subject.emoji(),
        detail.subject.display_name(),
        detail.grade,
        score,
        score.percentage(),
        score.band(),
        detail.created_at.format("%d/%m/%Y %H:%M")
    );
    for (index, answer) in detail.answers.iter().enumerate() {
        let mark = if answer.is_correct() { "✅" } else { "❌" };
        let given = if answer.given_answer().is_empty() {
            "-"
        } else {
            answer.given_answer()
        };
        println!(
            "{:>3}. {:<12} given {:<3} key {:<3} {mark}",
            index + 1,
            answer.code(),
            given,
            answer.answer_key()
        );
    }
}

pub fn review(review: &QuestionReview) {
    println!();
    println!("{}  {}", review.code, review.statement);
    if let Some(url) = &review.image_url {
        println!("[image: {url}]");
    }
    for alt in &review.alternatives {
        let tag = match (alt.is_given, alt.is_correct) {
            (true, true) => "your answer, correct",
            (true, false) => "your answer",
            (false, true) => "correct",
            (false, false) => "",
        };
        println!("   ({}) {} {}", alt.key, alt.text, tag);
    }
}

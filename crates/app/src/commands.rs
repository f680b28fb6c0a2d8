use std::fmt;
use std::io;

use quiz_core::model::{Credentials, ResultId, Subject};
use services::{
    AppServices, AuthError, AuthSession, ExitDecision, QuizError, QuizPhase, QuizSession,
    QuizSessionService, ResultHistory, ResultsError,
};
use tracing::{debug, warn};

use crate::console::{self, Prompt};

#[derive(Debug)]
pub enum CommandError {
    NotSignedIn,
    SessionExpired,
    InvalidCredentials,
    Auth(AuthError),
    Quiz(QuizError),
    Results(ResultsError),
    Io(io::Error),
}

impl CommandError {
    /// The server rejected the stored token.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            CommandError::Quiz(err) => err.is_unauthorized(),
            CommandError::Results(err) => err.is_unauthorized(),
            _ => false,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NotSignedIn => write!(f, "not signed in; run `quiz login` first"),
            CommandError::SessionExpired => {
                write!(f, "session expired; run `quiz login` to sign in again")
            }
            CommandError::InvalidCredentials => write!(f, "invalid email or password"),
            CommandError::Auth(err) => write!(f, "{err}"),
            CommandError::Quiz(err) => write!(f, "{err}"),
            CommandError::Results(err) => write!(f, "{err}"),
            CommandError::Io(err) => write!(f, "terminal error: {err}"),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<AuthError> for CommandError {
    fn from(err: AuthError) -> Self {
        CommandError::Auth(err)
    }
}

impl From<QuizError> for CommandError {
    fn from(err: QuizError) -> Self {
        CommandError::Quiz(err)
    }
}

impl From<ResultsError> for CommandError {
    fn from(err: ResultsError) -> Self {
        CommandError::Results(err)
    }
}

impl From<io::Error> for CommandError {
    fn from(err: io::Error) -> Self {
        CommandError::Io(err)
    }
}

pub async fn login(
    auth: &mut AuthSession,
    email: String,
    password: String,
) -> Result<(), CommandError> {
    let user = match auth.login(&Credentials::new(email, password)).await {
        Ok(user) => user,
        Err(AuthError::Remote(err)) if err.is_unauthorized() => {
            return Err(CommandError::InvalidCredentials);
        }
        Err(err) => return Err(err.into()),
    };
    match user.grade() {
        Some(grade) => println!("Signed in as {} (grade {grade}).", user.email),
        None => println!("Signed in as {}.", user.email),
    }
    Ok(())
}

pub async fn logout(auth: &mut AuthSession) {
    auth.teardown().await;
    println!("Signed out.");
}

/// Interactive quiz over stdin.
pub async fn quiz(
    app: &AppServices,
    auth: &AuthSession,
    subject: Subject,
    prompt: &mut Prompt,
) -> Result<(), CommandError> {
    if !auth.is_signed_in() {
        return Err(CommandError::NotSignedIn);
    }
    let quiz = app.quiz();

    println!(
        "{} {}: loading questions...",
        subject.emoji(),
        subject.display_name()
    );
    let mut session = quiz.start(subject, auth).await?;
    println!("Commands: A-D select, n next, p previous, q quit.");

    let outcome = drive(&quiz, &mut session, prompt).await;
    if outcome.is_err() {
        // Answers saved by a failed finalize must not outlive the command.
        if let Err(err) = quiz.close(&session).await {
            warn!(error = %err, "could not discard quiz answers");
        }
    }
    outcome
}

async fn drive(
    quiz: &QuizSessionService,
    session: &mut QuizSession,
    prompt: &mut Prompt,
) -> Result<(), CommandError> {
    loop {
        match session.phase().clone() {
            QuizPhase::Answering => {
                if let Some(question) = session.current_question() {
                    console::question(question, &session.progress());
                }
                let Some(input) = prompt.ask("> ").await? else {
                    return abort(quiz, session).await;
                };
                match input.to_ascii_lowercase().as_str() {
                    "" => {}
                    "n" => {
                        if let Err(err) = session.next() {
                            println!("{err}");
                        }
                    }
                    "p" => {
                        session.previous()?;
                    }
                    "q" => {
                        if confirm_exit(session, prompt).await? {
                            return abort(quiz, session).await;
                        }
                    }
                    _ => {
                        if let Err(err) = session.select_answer(&input.to_ascii_uppercase()) {
                            println!("{err}");
                        }
                    }
                }
            }
            QuizPhase::Confirming => {
                let progress = session.progress();
                println!();
                println!(
                    "All {} questions visited, {} answered.",
                    progress.total, progress.answered
                );
                if prompt.confirm("Finish and submit?").await? {
                    match quiz.finalize(session).await {
                        Ok(summary) => console::summary(summary),
                        Err(err) if err.is_unauthorized() => return Err(err.into()),
                        Err(err) => println!("Could not submit: {err}. You can try again."),
                    }
                } else {
                    session.cancel_confirmation()?;
                }
            }
            QuizPhase::Summary => {
                prompt.ask("Press Enter to finish.").await?;
                quiz.close(session).await?;
                return Ok(());
            }
            QuizPhase::Loading | QuizPhase::Submitting | QuizPhase::Error(_) => {
                debug!(phase = %session.phase(), "leaving quiz loop");
                return Ok(());
            }
        }
    }
}

async fn confirm_exit(session: &QuizSession, prompt: &mut Prompt) -> Result<bool, CommandError> {
    match session.exit_decision() {
        ExitDecision::Leave => Ok(true),
        ExitDecision::Blocked => Ok(false),
        ExitDecision::ConfirmAbort => Ok(prompt
            .confirm("Leave the quiz? Your answers will be lost.")
            .await?),
    }
}

async fn abort(quiz: &QuizSessionService, session: &QuizSession) -> Result<(), CommandError> {
    quiz.close(session).await?;
    println!("Quiz abandoned.");
    Ok(())
}

pub async fn results(
    app: &AppServices,
    auth: &AuthSession,
    page: u32,
    prompt: &mut Prompt,
) -> Result<(), CommandError> {
    let user = auth.user().ok_or(CommandError::NotSignedIn)?;
    let service = app.results();
    let mut history = ResultHistory::new(user.email.clone());
    history.load_from(&service, page).await?;

    if history.items().is_empty() {
        println!("No results yet.");
        return Ok(());
    }

    let mut shown = 0;
    loop {
        for (index, result) in history.items().iter().enumerate().skip(shown) {
            console::result_line(index, result);
        }
        shown = history.items().len();
        if !history.has_more() {
            println!("Listed {shown} results ({} in total).", history.total());
            return Ok(());
        }
        match prompt.ask("m to load more, Enter to stop: ").await? {
            Some(input) if input.eq_ignore_ascii_case("m") => {
                history.load_more(&service).await?;
            }
            _ => return Ok(()),
        }
    }
}

pub async fn result(
    app: &AppServices,
    auth: &AuthSession,
    id: &ResultId,
    review: bool,
) -> Result<(), CommandError> {
    if !auth.is_signed_in() {
        return Err(CommandError::NotSignedIn);
    }
    let service = app.results();
    let detail = service.detail(id).await?;
    console::result_detail(&detail);

    if review {
        for answer in &detail.answers {
            match service.review_question(answer).await {
                Ok(review) => console::review(&review),
                Err(ResultsError::NotFound(_)) => {
                    println!();
                    println!("{}  question no longer available", answer.code());
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
    Ok(())
}

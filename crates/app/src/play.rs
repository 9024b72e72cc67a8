//! Terminal host for a single lesson session.

use lesson_core::model::{CompletionAward, StepKindTag};
use lesson_core::session::SessionAction;
use services::{CompletionOutcome, LessonPlayer, PlayerError, StepView};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// What one line of learner input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Quit,
    Help,
    Actions(Vec<SessionAction>),
}

fn interpret(view: &StepView, line: &str) -> Input {
    let line = line.trim();
    match line {
        ":q" | ":quit" => return Input::Quit,
        ":h" | ":help" => return Input::Help,
        "?" | ":hint" => return Input::Actions(vec![SessionAction::ToggleHint]),
        _ => {}
    }

    if view.result.is_some() {
        return match line {
            "" | "n" | "next" => Input::Actions(vec![SessionAction::Advance]),
            "r" | "retry" => Input::Actions(vec![SessionAction::Retry]),
            _ => Input::Help,
        };
    }

    match view.kind {
        StepKindTag::MultipleChoice => match line.parse::<usize>() {
            Ok(choice) if choice >= 1 => Input::Actions(vec![
                SessionAction::SelectOption(choice - 1),
                SessionAction::Submit,
            ]),
            _ => Input::Help,
        },
        StepKindTag::Writing => Input::Actions(vec![
            SessionAction::EnterText(line.to_owned()),
            SessionAction::Submit,
        ]),
    }
}

fn render(view: &StepView) {
    println!();
    println!(
        "Step {}/{}  hearts {}/{}",
        view.position, view.total, view.hearts, view.max_hearts
    );
    println!("{}", view.prompt);
    if let Some(content) = &view.content {
        println!("  {content}");
    }
    for (index, option) in view.options.iter().enumerate() {
        let marker = if view.selected_option == Some(index) { '>' } else { ' ' };
        println!(" {marker}{}) {option}", index + 1);
    }
    if let Some(hint) = &view.hint {
        println!("hint: {hint}");
    }

    match &view.result {
        Some(result) => {
            if result.correct {
                println!("Correct!");
            } else if let Some(answer) = &result.correct_answer {
                println!("Not quite. The answer is: {answer}");
            }
            if let Some(explanation) = &result.explanation {
                println!("{explanation}");
            }
            if view.can_retry {
                println!("[enter] continue  [r] retry");
            } else {
                println!("[enter] continue");
            }
        }
        None if view.has_hint && view.hint.is_none() => println!("(type ? for a hint)"),
        None => {}
    }
}

fn print_help(view: &StepView) {
    if view.result.is_some() {
        println!("Press enter to continue, r to retry, :q to quit.");
    } else if view.kind == StepKindTag::MultipleChoice {
        println!("Type an option number (1-{}), ? for a hint, :q to quit.", view.options.len());
    } else {
        println!("Type your answer, ? for a hint, :q to quit.");
    }
}

fn report_completion(outcome: &CompletionOutcome) {
    match outcome.award {
        CompletionAward::Awarded { points, streak } => {
            println!("+{points} points, +{streak} streak");
        }
        CompletionAward::AlreadyCompleted => println!("Already completed; no new points."),
    }
    println!(
        "Total: {} points, streak {}",
        outcome.progress.points(),
        outcome.progress.streak()
    );
    if !outcome.persisted {
        println!("(progress could not be saved)");
    }
}

/// Play `lesson_id` until it completes, fails, or the learner quits.
///
/// # Errors
///
/// Returns an error if the lesson does not exist or stdin/stdout fail.
pub async fn play_lesson(
    player: &LessonPlayer,
    language: &str,
    lesson_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = player.start_lesson(language, lesson_id)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("{} ({language})", session.lesson().title());

    loop {
        let view = StepView::from_session(&session);
        if view.completed {
            println!("Lesson complete!");
            return Ok(());
        }
        if view.failed {
            render(&view);
            println!("Out of hearts. Lesson failed.");
            return Ok(());
        }

        render(&view);
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            println!();
            return Ok(());
        };

        let actions = match interpret(&view, &line) {
            Input::Quit => return Ok(()),
            Input::Help => {
                print_help(&view);
                continue;
            }
            Input::Actions(actions) => actions,
        };

        for action in actions {
            match player.dispatch(&mut session, action).await {
                Ok(outcome) => {
                    if let Some(completion) = &outcome.completion {
                        report_completion(completion);
                    }
                }
                Err(PlayerError::Session(err)) => {
                    println!("{err}");
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

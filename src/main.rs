mod config;
mod quiz;
mod render;

use std::sync::Arc;

use dotenv::dotenv;
use log::{error, info, warn};
use quiz::session::{Answers, QuizSession, Session};
use quiz::scorer::ScoreReport;
use quiz::Dataset;
use teloxide::{
    dispatching::dialogue::InMemStorage,
    prelude::*,
    types::{KeyboardButton, KeyboardMarkup, KeyboardRemove},
};

use crate::config::Config;

type QuizDialogue = Dialogue<Session, InMemStorage<Session>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Result of the single question bank load done at startup.
enum Bank {
    Ready(Dataset),
    Unavailable(String),
}

const START_COMMAND: &str = "/start";
const RESTART_COMMAND: &str = "/restart";
const RESTART_BUTTON: &str = "Restart";
const SKIP_BUTTON: &str = "Skip";
const SUBMIT_BUTTON: &str = "Submit";

#[tokio::main]
async fn main() {
    dotenv().ok();
    pretty_env_logger::init();
    info!("Starting quiz bot...");

    let config = Config::from_env().expect("Invalid configuration");

    let bank = match quiz::bank::load(&config.bank_source, config.load_timeout).await {
        Ok(dataset) => Bank::Ready(dataset),
        Err(err) => {
            error!("Error loading quiz data: {}", err);
            Bank::Unavailable(render::load_failure(&config.bank_source))
        }
    };

    let bot = Bot::from_env();

    Dispatcher::builder(
        bot,
        Update::filter_message()
            .enter_dialogue::<Message, InMemStorage<Session>, Session>()
            .branch(dptree::filter(is_restart).endpoint(restart))
            .branch(dptree::case![Session::Idle].endpoint(idle))
            .branch(dptree::case![Session::Active { quiz, answers }].endpoint(active))
            .branch(dptree::case![Session::Scored { subject_name, report }].endpoint(scored)),
    )
    .dependencies(dptree::deps![InMemStorage::<Session>::new(), Arc::new(bank)])
    .enable_ctrlc_handler()
    .build()
    .dispatch()
    .await;
}

fn is_restart(msg: Message) -> bool {
    matches!(msg.text(), Some(RESTART_COMMAND) | Some(RESTART_BUTTON))
}

fn subject_keyboard(dataset: &Dataset) -> KeyboardMarkup {
    KeyboardMarkup::new(
        dataset
            .subjects()
            .iter()
            .map(|subject| vec![KeyboardButton::new(subject.name.clone())])
            .collect::<Vec<_>>(),
    )
}

async fn prompt_subjects(bot: &Bot, chat_id: ChatId, bank: &Bank) -> HandlerResult {
    match bank {
        Bank::Ready(dataset) => {
            bot.send_message(chat_id, render::subject_prompt(dataset))
                .reply_markup(subject_keyboard(dataset))
                .await?;
        }
        Bank::Unavailable(message) => {
            bot.send_message(chat_id, message.as_str())
                .reply_markup(KeyboardRemove::new())
                .await?;
        }
    }
    Ok(())
}

async fn ask_question(bot: &Bot, chat_id: ChatId, quiz: &QuizSession, index: usize) -> HandlerResult {
    let sampled = &quiz.questions[index];

    let mut rows = sampled
        .options
        .iter()
        .map(|option| vec![KeyboardButton::new(option.clone())])
        .collect::<Vec<_>>();
    rows.push(vec![
        KeyboardButton::new(SKIP_BUTTON),
        KeyboardButton::new(SUBMIT_BUTTON),
    ]);

    bot.send_message(chat_id, render::question_card(index, sampled))
        .reply_markup(KeyboardMarkup::new(rows))
        .await?;
    Ok(())
}

async fn idle(bot: Bot, dialogue: QuizDialogue, msg: Message, bank: Arc<Bank>) -> HandlerResult {
    let dataset = match bank.as_ref() {
        Bank::Ready(dataset) => dataset,
        Bank::Unavailable(_) => return prompt_subjects(&bot, msg.chat.id, &bank).await,
    };

    // Buttons carry subject names; typed ids are accepted as well
    let selection = match msg.text() {
        Some(START_COMMAND) => return prompt_subjects(&bot, msg.chat.id, &bank).await,
        Some(text) => dataset
            .find_by_name(text)
            .map(|subject| subject.id.as_str())
            .unwrap_or(text),
        None => "",
    };

    let mut session = Session::Idle;
    let started = session.start_session(dataset, selection, &mut rand::thread_rng());
    let quiz = match started {
        Ok(quiz) => quiz,
        Err(err) => {
            warn!("Could not start a test in chat {}: {}", msg.chat.id.0, err);
            bot.send_message(msg.chat.id, err.to_string())
                .reply_markup(subject_keyboard(dataset))
                .await?;
            return Ok(());
        }
    };

    info!("Chat {} started a test on subject {}", msg.chat.id.0, quiz.subject_id);
    bot.send_message(
        msg.chat.id,
        render::quiz_title(&quiz.subject_name, quiz.questions.len()),
    )
    .await?;
    ask_question(&bot, msg.chat.id, quiz, 0).await?;

    dialogue.update(session).await?;
    Ok(())
}

async fn active(
    bot: Bot,
    dialogue: QuizDialogue,
    msg: Message,
    (quiz, answers): (QuizSession, Answers),
) -> HandlerResult {
    let mut session = Session::Active { quiz, answers };
    let Some(index) = session.next_unanswered() else {
        return finish(bot, dialogue, msg.chat.id, session).await;
    };

    match msg.text() {
        Some(SUBMIT_BUTTON) => return finish(bot, dialogue, msg.chat.id, session).await,
        Some(SKIP_BUTTON) => session.record_answer(index, None)?,
        Some(text) => session.record_answer(index, Some(text.to_string()))?,
        None => {
            bot.send_message(
                msg.chat.id,
                format!("Please pick an option, {} or {}.", SKIP_BUTTON, SUBMIT_BUTTON),
            )
            .await?;
            return Ok(());
        }
    }

    let Some(next) = session.next_unanswered() else {
        return finish(bot, dialogue, msg.chat.id, session).await;
    };
    if let Some(quiz) = session.quiz() {
        ask_question(&bot, msg.chat.id, quiz, next).await?;
    }

    dialogue.update(session).await?;
    Ok(())
}

/// Grades the test; questions not reached yet count as unanswered.
async fn finish(bot: Bot, dialogue: QuizDialogue, chat_id: ChatId, mut session: Session) -> HandlerResult {
    session.submit(Answers::new())?;

    if let Session::Scored { subject_name, report } = &session {
        bot.send_message(chat_id, render::results(subject_name, report))
            .reply_markup(KeyboardRemove::new())
            .await?;
        for review in render::review_messages(report) {
            bot.send_message(chat_id, review).await?;
        }
        bot.send_message(chat_id, "Want to try again?")
            .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(RESTART_BUTTON)]]))
            .await?;
    }

    dialogue.update(session).await?;
    Ok(())
}

async fn scored(
    bot: Bot,
    msg: Message,
    (subject_name, report): (String, ScoreReport),
) -> HandlerResult {
    let mut session = Session::Scored { subject_name, report };

    let reply = match msg.text() {
        Some(SUBMIT_BUTTON) => session.submit(Answers::new()).err().map(|err| err.to_string()),
        _ => None,
    }
    .unwrap_or_else(|| format!("Press {} to take another test.", RESTART_BUTTON));

    bot.send_message(msg.chat.id, reply)
        .reply_markup(KeyboardMarkup::new(vec![vec![KeyboardButton::new(RESTART_BUTTON)]]))
        .await?;
    Ok(())
}

async fn restart(bot: Bot, dialogue: QuizDialogue, msg: Message, bank: Arc<Bank>) -> HandlerResult {
    let mut session = dialogue.get_or_default().await?;
    session.restart();
    dialogue.update(session).await?;

    prompt_subjects(&bot, msg.chat.id, &bank).await
}

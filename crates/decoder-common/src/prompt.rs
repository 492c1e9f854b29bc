//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Operator prompts for interactive and unattended runs."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::collections::VecDeque;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::console::Console;

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("input stream closed")]
    Closed,
    #[error("failed to read operator input: {0}")]
    Io(#[from] std::io::Error),
}

/// Source of operator answers.
#[async_trait]
pub trait Prompter: Send {
    /// Show `prompt` and return the operator's answer with surrounding whitespace removed.
    async fn read_line(&mut self, prompt: &str) -> Result<String, PromptError>;

    /// Block until the operator acknowledges `prompt`.
    async fn acknowledge(&mut self, prompt: &str) -> Result<(), PromptError> {
        self.read_line(prompt).await.map(|_| ())
    }

    /// False for unattended prompters that never wait on a human.
    fn is_interactive(&self) -> bool {
        true
    }
}

/// Reads answers line by line from the process stdin.
pub struct StdinPrompter {
    console: Console,
    lines: Lines<BufReader<Stdin>>,
}

impl StdinPrompter {
    pub fn new(console: Console) -> Self {
        Self {
            console,
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

#[async_trait]
impl Prompter for StdinPrompter {
    async fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.console.inline(prompt);
        match self.lines.next_line().await? {
            Some(line) => Ok(line.trim().to_owned()),
            None => Err(PromptError::Closed),
        }
    }
}

/// Answers every question with a fixed reply and never pauses.
#[derive(Debug, Clone)]
pub struct AutoPrompter {
    answer: String,
}

impl AutoPrompter {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

#[async_trait]
impl Prompter for AutoPrompter {
    async fn read_line(&mut self, _prompt: &str) -> Result<String, PromptError> {
        Ok(self.answer.clone())
    }

    async fn acknowledge(&mut self, _prompt: &str) -> Result<(), PromptError> {
        Ok(())
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Replays a fixed list of answers; acknowledgements are recorded but consume nothing.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompter {
    replies: VecDeque<String>,
    prompts: Vec<String>,
    acknowledgements: usize,
}

impl ScriptedPrompter {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Every prompt shown so far, acknowledgements included.
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn acknowledgements(&self) -> usize {
        self.acknowledgements
    }

    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn read_line(&mut self, prompt: &str) -> Result<String, PromptError> {
        self.prompts.push(prompt.to_owned());
        self.replies
            .pop_front()
            .map(|reply| reply.trim().to_owned())
            .ok_or(PromptError::Closed)
    }

    async fn acknowledge(&mut self, prompt: &str) -> Result<(), PromptError> {
        self.prompts.push(prompt.to_owned());
        self.acknowledgements += 1;
        Ok(())
    }
}

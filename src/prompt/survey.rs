//! The installer's question sequence.
//!
//! Split in two so the install root and `libs/` can be prepared, and the
//! installed set listed, between the path question and the rest.

use super::{PromptError, Prompter};
use crate::models::layout::DASHBOARD_DIR;
use crate::models::{Library, Network, NodeMode, Options, OptionsBuilder, OptionsError, WalletMode};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use thiserror::Error;

/// Install directory offered under the working directory.
pub const DEFAULT_INSTALL_DIR: &str = "app";

#[derive(Error, Debug)]
pub enum SurveyError {
    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Options(#[from] OptionsError),
}

fn choose<P, T>(
    prompter: &P,
    prompt: &str,
    choices: &[T],
    label: fn(T) -> &'static str,
) -> Result<T, PromptError>
where
    P: Prompter + ?Sized,
    T: Copy,
{
    let items: Vec<String> = choices.iter().map(|choice| label(*choice).to_string()).collect();
    let index = prompter.select(prompt, &items, 0)?;
    choices
        .get(index)
        .copied()
        .ok_or_else(|| PromptError::InvalidChoice {
            prompt: prompt.to_string(),
            index,
        })
}

/// Ask for the install root, defaulting to `<cwd>/app`.
pub fn ask_path<P: Prompter + ?Sized>(prompter: &P, cwd: &Utf8Path) -> Result<OptionsBuilder, PromptError> {
    let default = cwd.join(DEFAULT_INSTALL_DIR);
    let answer = prompter.input("Select ezbcoin path", default.as_str())?;

    let path = if answer.is_empty() {
        default
    } else {
        Utf8PathBuf::from(answer)
    };
    tracing::info!("Install path: {}", path);
    Ok(OptionsBuilder::new().with_path(path))
}

/// Ask everything after the path. Choices narrow with earlier answers.
pub fn ask_rest<P: Prompter + ?Sized>(
    prompter: &P,
    builder: OptionsBuilder,
    installed: &BTreeSet<String>,
) -> Result<Options, SurveyError> {
    let library = choose(prompter, "Choose a library to install", &Library::ALL, Library::label)?;
    let network = choose(prompter, "Choose a network to run on", library.networks(), Network::name)?;
    let node = choose(prompter, "Choose a type of node", &NodeMode::ALL, NodeMode::label)?;
    let wallet = choose(prompter, "Choose a wallet", library.wallet_modes(), WalletMode::label)?;

    let mut builder = builder.with_library(library).with_node(network, node, wallet);

    if network == Network::Simnet {
        let peers = prompter.input("Simnet peers to connect to (comma-separated host:port)", "")?;
        builder = builder.with_peers(peers);
    }

    let prompt = if installed.contains(DASHBOARD_DIR) {
        "Would you like to connect this node to bPanel?"
    } else {
        "Would you like to install and connect to bPanel?"
    };
    let dashboard = prompter.confirm(prompt, true)?;

    let options = builder.with_dashboard(dashboard).build()?;
    tracing::info!(
        "Survey answers: {} {} {} node, wallet {}, dashboard {}",
        options.library,
        options.network,
        options.node,
        options.wallet,
        options.dashboard
    );
    Ok(options)
}

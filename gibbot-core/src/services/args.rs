// File: gibbot-core/src/services/args.rs

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Positional,
    Named,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdArg {
    pub name: String,
    pub value: String,
    pub kind: ArgKind,
    /// Intended index for this arg in the args list (for positional args).
    pub index: usize,
}

/// Parse everything after the command token. `key:value` tokens (split on
/// the first colon) become named arguments; bare tokens are positional,
/// keyed by their own text and keeping their original index, so commands can
/// accept either calling convention. A message with no arguments parses to
/// `None`.
pub fn parse_args(msg: &str) -> Option<Vec<CmdArg>> {
    let tokens: Vec<&str> = msg.trim().split(' ').collect();
    if tokens.len() <= 1 {
        return None;
    }

    let args = tokens[1..]
        .iter()
        .enumerate()
        .map(|(i, token)| match token.split_once(':') {
            Some((name, value)) => CmdArg {
                name: name.to_string(),
                value: value.to_string(),
                kind: ArgKind::Named,
                index: 0,
            },
            None => CmdArg {
                name: token.to_string(),
                value: token.to_string(),
                kind: ArgKind::Positional,
                index: i,
            },
        })
        .collect();

    Some(args)
}

/// Name-keyed view over a parsed argument list. Later duplicates win.
pub fn args_by_name(args: &[CmdArg]) -> HashMap<&str, &CmdArg> {
    args.iter().map(|a| (a.name.as_str(), a)).collect()
}

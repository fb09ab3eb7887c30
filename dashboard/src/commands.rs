use shared::{NetworkKey, TxKind};

use crate::services::AmountInput;

pub const HELP: &str = "\
Commands:
  deposit <vault> [amount|max]   open the deposit dialog (and submit)
  redeem <vault> [amount|max]    open the withdrawal dialog (and submit)
  submit <amount|max>            submit the open dialog
  close                          close the open dialog
  refresh                        reload stats and balances
  status                         show session state
  help                           show this help
  quit                           exit
Vaults: arbitrum (defi), base (stable)";

/// One interactive instruction for the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Open { kind: TxKind, network: NetworkKey },
    Submit(AmountInput),
    Close,
    Refresh,
    Status,
    Help,
    Quit,
    Unknown(String),
}

/// Parses one input line. `deposit base 100` expands to an open followed by
/// a submit. Blank lines yield nothing.
pub fn parse_line(line: &str) -> Vec<UserCommand> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Vec::new();
    };
    let args: Vec<&str> = words.collect();

    match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("deposit", [vault, rest @ ..]) => open_and_submit(TxKind::Deposit, vault, rest),
        ("redeem" | "withdraw", [vault, rest @ ..]) => open_and_submit(TxKind::Redeem, vault, rest),
        ("deposit" | "redeem" | "withdraw", []) => {
            vec![UserCommand::Unknown(format!("Usage: {} <vault> [amount|max]", verb))]
        }
        ("submit", [amount]) => vec![UserCommand::Submit(parse_amount(amount))],
        ("submit", _) => vec![UserCommand::Unknown("Usage: submit <amount|max>".to_string())],
        ("close", []) => vec![UserCommand::Close],
        ("refresh", []) => vec![UserCommand::Refresh],
        ("status", []) => vec![UserCommand::Status],
        ("help" | "?", _) => vec![UserCommand::Help],
        ("quit" | "exit", []) => vec![UserCommand::Quit],
        _ => vec![UserCommand::Unknown(format!("Unknown command: {}", line.trim()))],
    }
}

fn open_and_submit(kind: TxKind, vault: &str, rest: &[&str]) -> Vec<UserCommand> {
    let network = match vault.parse::<NetworkKey>() {
        Ok(network) => network,
        Err(e) => return vec![UserCommand::Unknown(e.user_message())],
    };
    let mut commands = vec![UserCommand::Open { kind, network }];
    match rest {
        [] => {}
        [amount] => commands.push(UserCommand::Submit(parse_amount(amount))),
        _ => return vec![UserCommand::Unknown(format!("Usage: {} <vault> [amount|max]", kind))],
    }
    commands
}

fn parse_amount(text: &str) -> AmountInput {
    match text.parse() {
        Ok(amount) => amount,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deposit_with_amount_opens_then_submits() {
        assert_eq!(
            parse_line("deposit defi 1000"),
            vec![
                UserCommand::Open {
                    kind: TxKind::Deposit,
                    network: NetworkKey::Arbitrum
                },
                UserCommand::Submit(AmountInput::Exact("1000".into())),
            ]
        );
    }

    #[test]
    fn redeem_without_amount_only_opens() {
        assert_eq!(
            parse_line("  redeem base "),
            vec![UserCommand::Open {
                kind: TxKind::Redeem,
                network: NetworkKey::Base
            }]
        );
        assert_eq!(parse_line("submit MAX"), vec![UserCommand::Submit(AmountInput::Max)]);
    }

    #[test]
    fn unknown_vault_and_verbs_are_reported() {
        assert_eq!(
            parse_line("deposit solana 5"),
            vec![UserCommand::Unknown("Unknown vault: solana".into())]
        );
        assert!(matches!(parse_line("dance")[..], [UserCommand::Unknown(_)]));
        assert!(parse_line("   ").is_empty());
        assert_eq!(parse_line("quit"), vec![UserCommand::Quit]);
    }
}

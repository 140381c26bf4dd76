//! DOT-graph visualization of bank state.
//!
//! Debug-flag gated; reads a snapshot and renders it, never mutates
//! core state.

use std::fmt::Write;

use banksim_bank::BankSnapshot;

/// Render a bank snapshot as a DOT digraph.
///
/// Accounts become nodes (locked accounts are filled and annotated
/// with the lock owner); in-progress transfers become edges from
/// source to destination labelled with the amount and executor.
pub fn render_dot(snapshot: &BankSnapshot) -> String {
    let mut out = String::from("digraph bank {\n    rankdir=LR;\n    node [shape=record];\n");

    for account in &snapshot.accounts {
        let label = match account.lock_owner {
            Some(owner) => format!("{} | {} | {}", account.name, account.balance, owner),
            None => format!("{} | {}", account.name, account.balance),
        };
        let fill = if account.locked { "salmon" } else { "white" };
        let _ = writeln!(
            out,
            "    \"{}\" [label=\"{}\", style=filled, fillcolor={}];",
            account.name, label, fill
        );
    }

    for entry in &snapshot.in_progress {
        let from = &snapshot.accounts[entry.transfer.from.index()].name;
        let to = &snapshot.accounts[entry.transfer.to.index()].name;
        let _ = writeln!(
            out,
            "    \"{}\" -> \"{}\" [label=\"{} (executor-{})\"];",
            from, to, entry.transfer.amount, entry.executor
        );
    }

    out.push_str("}\n");
    out
}

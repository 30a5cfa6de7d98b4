//! Finding the counterpart in the contact list.
use crate::importer::Contact;
use serde::Serialize;
use std::io::{self, BufRead, Write};

/// Contacts above this many messages are offered when nothing matches by name.
pub const SHORTLIST_MIN_MESSAGES: u64 = 1000;
pub const SHORTLIST_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partner {
    pub wxid: String,
    pub name: String,
    pub msg_count: u64,
}

impl From<&Contact> for Partner {
    fn from(c: &Contact) -> Self {
        Self {
            wxid: c.wxid.clone(),
            name: c.display_name().to_string(),
            msg_count: c.msg_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// First name match in server order.
    Matched(Partner),
    /// No name matched; busy one-on-one chats the operator can pick from.
    Ambiguous(Vec<Partner>),
}

fn names_overlap(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    a.contains(&b) || b.contains(&a)
}

fn one_on_one(contacts: &[Contact]) -> impl Iterator<Item = &Contact> {
    contacts.iter().filter(|c| !c.is_group())
}

/// Match `query` against the display names of all one-on-one contacts.
///
/// Either side may contain the other, case-insensitively. When several contacts
/// match, the first one wins; see [`other_matches`] to warn about the rest.
pub fn resolve(query: &str, contacts: &[Contact]) -> Resolution {
    if let Some(hit) = one_on_one(contacts).find(|c| names_overlap(query, c.display_name())) {
        return Resolution::Matched(hit.into());
    }

    let shortlist = one_on_one(contacts)
        .filter(|c| c.msg_count > SHORTLIST_MIN_MESSAGES)
        .take(SHORTLIST_LEN)
        .map(Partner::from)
        .collect();
    Resolution::Ambiguous(shortlist)
}

/// Contacts that also matched `query` but lost to `chosen`.
pub fn other_matches<'a>(query: &str, contacts: &'a [Contact], chosen: &Partner) -> Vec<&'a str> {
    one_on_one(contacts)
        .filter(|c| c.wxid != chosen.wxid && names_overlap(query, c.display_name()))
        .map(Contact::display_name)
        .collect()
}

/// Apply an operator answer to the shortlist: a 1-based ordinal, or a name fragment.
pub fn choose(shortlist: &[Partner], answer: &str) -> Option<Partner> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    if let Ok(n) = answer.parse::<usize>()
        && (1..=shortlist.len()).contains(&n)
    {
        return Some(shortlist[n - 1].clone());
    }
    let needle = answer.to_lowercase();
    shortlist
        .iter()
        .find(|p| p.name.to_lowercase().contains(&needle))
        .cloned()
}

/// Decides between shortlisted contacts when the query matched nobody.
pub trait Chooser {
    fn choose(&mut self, query: &str, shortlist: &[Partner]) -> Option<Partner>;
}

/// Never picks anyone.
pub struct NoChooser;

impl Chooser for NoChooser {
    fn choose(&mut self, _query: &str, _shortlist: &[Partner]) -> Option<Partner> {
        None
    }
}

/// Lists the shortlist and reads one answer line.
pub struct PromptChooser<R, W> {
    input: R,
    output: W,
}

impl PromptChooser<io::StdinLock<'static>, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> PromptChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn prompt(&mut self, query: &str, shortlist: &[Partner]) -> io::Result<String> {
        writeln!(
            self.output,
            "\nNo contact matches '{}'. Pick one of these instead:",
            query
        )?;
        for (i, p) in shortlist.iter().enumerate() {
            writeln!(self.output, "  {}. {} ({} messages)", i + 1, p.name, p.msg_count)?;
        }
        write!(self.output, "\nNumber or name: ")?;
        self.output.flush()?;

        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line)
    }
}

impl<R: BufRead, W: Write> Chooser for PromptChooser<R, W> {
    fn choose(&mut self, query: &str, shortlist: &[Partner]) -> Option<Partner> {
        if shortlist.is_empty() {
            return None;
        }
        match self.prompt(query, shortlist) {
            Ok(answer) => choose(shortlist, &answer),
            Err(e) => {
                tracing::warn!("Could not read selection: {}", e);
                None
            }
        }
    }
}

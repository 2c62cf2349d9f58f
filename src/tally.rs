//! Collect the users who picked a qualifying answer on a poll.

use std::collections::{BTreeSet, HashSet};

use crate::error::RemoteError;
use crate::messenger::{Messenger, PollRef, UserId};

/// The votes for a poll could not be read. Distinct from "nobody qualified":
/// callers must leave stored streaks alone when they see this.
#[derive(Debug, thiserror::Error)]
#[error("could not read votes for option {option} of poll {}: {source}", .poll.0)]
pub struct TallyError {
    pub poll: PollRef,
    pub option: u8,
    #[source]
    pub source: RemoteError,
}

/// Union of voters over every qualifying option, paging until the service
/// reports an empty page, no continuation, or an offset it already returned.
pub fn tally<M>(
    messenger: &M,
    poll: PollRef,
    qualifying_options: &[u8],
    page_size: u32,
) -> Result<BTreeSet<UserId>, TallyError>
where
    M: Messenger + ?Sized,
{
    let mut voters = BTreeSet::new();

    for &option in qualifying_options {
        let mut offset: Option<String> = None;
        let mut seen: HashSet<String> = HashSet::new();
        let mut pages = 0usize;
        loop {
            let page = messenger
                .vote_page(poll, option, offset.as_deref(), page_size)
                .map_err(|source| TallyError {
                    poll,
                    option,
                    source,
                })?;
            pages += 1;

            if page.users.is_empty() {
                break;
            }
            voters.extend(page.users);

            match page.next_offset {
                Some(next) if !next.is_empty() && seen.insert(next.clone()) => {
                    offset = Some(next);
                }
                _ => break,
            }
        }
        tracing::debug!(option, pages, "read qualifying votes");
    }

    Ok(voters)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;
    use crate::messenger::{MessageId, Participant, VotePage};

    /// Serves canned vote pages keyed by (option, offset).
    #[derive(Default)]
    struct PagedVotes {
        pages: HashMap<(u8, Option<String>), Result<VotePage, RemoteError>>,
        calls: RefCell<Vec<(u8, Option<String>)>>,
    }

    impl PagedVotes {
        fn page(mut self, option: u8, offset: Option<&str>, users: &[&str], next: Option<&str>) -> Self {
            self.pages.insert(
                (option, offset.map(str::to_string)),
                Ok(VotePage {
                    users: users.iter().map(|u| UserId::from(*u)).collect(),
                    next_offset: next.map(str::to_string),
                }),
            );
            self
        }

        fn fail(mut self, option: u8, offset: Option<&str>, err: RemoteError) -> Self {
            self.pages.insert((option, offset.map(str::to_string)), Err(err));
            self
        }
    }

    impl Messenger for PagedVotes {
        fn send_message(&self, _: &str) -> Result<MessageId, RemoteError> {
            unreachable!()
        }
        fn edit_message(&self, _: MessageId, _: &str) -> Result<(), RemoteError> {
            unreachable!()
        }
        fn delete_message(&self, _: MessageId) -> Result<(), RemoteError> {
            unreachable!()
        }
        fn pin_message(&self, _: MessageId) -> Result<(), RemoteError> {
            unreachable!()
        }
        fn send_poll(&self, _: &str, _: &[&str]) -> Result<MessageId, RemoteError> {
            unreachable!()
        }
        fn stop_poll(&self, _: MessageId) -> Result<(), RemoteError> {
            unreachable!()
        }
        fn list_participants(&self) -> Result<Vec<Participant>, RemoteError> {
            unreachable!()
        }
        fn vote_page(
            &self,
            _: PollRef,
            option: u8,
            offset: Option<&str>,
            _: u32,
        ) -> Result<VotePage, RemoteError> {
            let key = (option, offset.map(str::to_string));
            self.calls.borrow_mut().push(key.clone());
            self.pages.get(&key).cloned().unwrap_or_else(|| Ok(VotePage::default()))
        }
        fn resolve_user(&self, _: &UserId) -> Result<String, RemoteError> {
            unreachable!()
        }
        fn pin_notice(&self) -> Result<Option<MessageId>, RemoteError> {
            unreachable!()
        }
    }

    const POLL: PollRef = PollRef(MessageId(100));

    fn ids(voters: &BTreeSet<UserId>) -> Vec<&str> {
        voters.iter().map(|u| u.0.as_str()).collect()
    }

    #[test]
    fn unions_across_options_and_pages() {
        let votes = PagedVotes::default()
            .page(5, None, &["1", "2"], Some("p2"))
            .page(5, Some("p2"), &["3"], None)
            .page(6, None, &["2", "4"], Some(""));

        let voters = tally(&votes, POLL, &[5, 6], 50).unwrap();
        assert_eq!(ids(&voters), vec!["1", "2", "3", "4"]);
        assert_eq!(
            *votes.calls.borrow(),
            vec![(5, None), (5, Some("p2".into())), (6, None)]
        );
    }

    #[test]
    fn empty_page_stops_even_with_offset() {
        let votes = PagedVotes::default().page(5, None, &[], Some("more"));
        let voters = tally(&votes, POLL, &[5], 50).unwrap();
        assert!(voters.is_empty());
        assert_eq!(votes.calls.borrow().len(), 1);
    }

    #[test]
    fn repeated_offset_does_not_loop_forever() {
        let votes = PagedVotes::default()
            .page(5, None, &["1"], Some("same"))
            .page(5, Some("same"), &["2"], Some("same"));
        let voters = tally(&votes, POLL, &[5], 50).unwrap();
        assert_eq!(ids(&voters), vec!["1", "2"]);
        assert_eq!(votes.calls.borrow().len(), 2);
    }

    #[test]
    fn cycling_offsets_stop_after_one_lap() {
        let votes = PagedVotes::default()
            .page(6, None, &["1"], Some("a"))
            .page(6, Some("a"), &["2"], Some("b"))
            .page(6, Some("b"), &["3"], Some("a"));
        let voters = tally(&votes, POLL, &[6], 50).unwrap();
        assert_eq!(ids(&voters), vec!["1", "2", "3"]);
        assert_eq!(
            *votes.calls.borrow(),
            vec![(6, None), (6, Some("a".into())), (6, Some("b".into()))]
        );
    }

    #[test]
    fn no_votes_is_an_empty_success() {
        let votes = PagedVotes::default();
        let voters = tally(&votes, POLL, &[5, 6], 50).unwrap();
        assert!(voters.is_empty());
    }

    #[test]
    fn read_failure_is_an_error_not_an_empty_set() {
        let votes = PagedVotes::default()
            .page(5, None, &["1"], None)
            .fail(6, None, RemoteError::Transient("timeout".into()));
        let err = tally(&votes, POLL, &[5, 6], 50).unwrap_err();
        assert_eq!(err.option, 6);
        assert_eq!(err.source, RemoteError::Transient("timeout".into()));
    }
}

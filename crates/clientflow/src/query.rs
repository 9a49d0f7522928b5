//! Query pipeline: filter, sort and paginate the client collection.
//!
//! Everything here is a pure function of its inputs and is recomputed from
//! scratch on each call. Collections are small (hundreds of records), so no
//! result is cached.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::config::DEFAULT_PAGE_SIZE;

/// Field a listing can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Record id.
    Id,
    /// Full name.
    FullName,
    /// Email address.
    Email,
    /// Phone number.
    Phone,
    /// Postal address.
    Address,
    /// Gender, compared by its lowercase text.
    Gender,
    /// Date of birth.
    Dob,
    /// Avatar data URI; absent on most records.
    Avatar,
    /// Creation time.
    CreatedAt,
}

impl SortKey {
    /// All sortable keys.
    pub const ALL: [Self; 9] = [
        Self::Id,
        Self::FullName,
        Self::Email,
        Self::Phone,
        Self::Address,
        Self::Gender,
        Self::Dob,
        Self::Avatar,
        Self::CreatedAt,
    ];

    /// The persisted field name for this key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::FullName => "fullName",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Gender => "gender",
            Self::Dob => "dob",
            Self::Avatar => "avatar",
            Self::CreatedAt => "createdAt",
        }
    }

    fn value<'a>(&self, client: &'a Client) -> Option<SortValue<'a>> {
        match self {
            Self::Id => Some(SortValue::Text(&client.id)),
            Self::FullName => Some(SortValue::Text(&client.full_name)),
            Self::Email => Some(SortValue::Text(&client.email)),
            Self::Phone => Some(SortValue::Text(&client.phone)),
            Self::Address => Some(SortValue::Text(&client.address)),
            Self::Gender => Some(SortValue::Text(client.gender.as_str())),
            Self::Dob => Some(SortValue::Text(&client.dob)),
            Self::Avatar => client.avatar.as_deref().map(SortValue::Text),
            Self::CreatedAt => Some(SortValue::Number(client.created_at)),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when text names no sortable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSortKey(pub String);

impl fmt::Display for UnknownSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sort key: {}", self.0)
    }
}

impl std::error::Error for UnknownSortKey {}

impl FromStr for SortKey {
    type Err = UnknownSortKey;

    /// Accepts the persisted field name (`fullName`) or its snake/kebab
    /// spelling (`full_name`, `full-name`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();

        Self::ALL
            .into_iter()
            .find(|key| key.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| UnknownSortKey(s.to_string()))
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SortValue<'a> {
    Text(&'a str),
    Number(i64),
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Asc,
    /// Largest first.
    Desc,
}

/// Which field to sort by, and in which direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Field to compare.
    pub key: SortKey,
    /// Direction of the comparison.
    pub direction: SortDirection,
}

impl SortConfig {
    /// Create a sort configuration.
    #[must_use]
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// The configuration after the user selects `key`.
    ///
    /// Selecting the current key while ascending flips to descending; any
    /// other selection sorts ascending by `key`.
    #[must_use]
    pub fn toggled(self, key: SortKey) -> Self {
        let direction = if self.key == key && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Self { key, direction }
    }
}

impl Default for SortConfig {
    /// Newest first.
    fn default() -> Self {
        Self::new(SortKey::CreatedAt, SortDirection::Desc)
    }
}

/// Keep the clients whose name, email or address contains `term`,
/// ignoring case. An empty term keeps everything.
#[must_use]
pub fn filter_clients<'a>(clients: &'a [Client], term: &str) -> Vec<&'a Client> {
    let needle = term.to_lowercase();
    clients
        .iter()
        .filter(|client| {
            client.full_name.to_lowercase().contains(&needle)
                || client.email.to_lowercase().contains(&needle)
                || client.address.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Compare two clients under `sort`.
///
/// A client with no value for the key sorts after one that has it, in both
/// directions. Equal values compare equal; there is no tie-break.
#[must_use]
pub fn compare_clients(sort: SortConfig, a: &Client, b: &Client) -> Ordering {
    match (sort.key.value(a), sort.key.value(b)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match sort.direction {
            SortDirection::Asc => a.cmp(&b),
            SortDirection::Desc => b.cmp(&a),
        },
    }
}

/// Sort clients in place. The sort is stable.
pub fn sort_clients(clients: &mut [&Client], sort: SortConfig) {
    clients.sort_by(|a, b| compare_clients(sort, a, b));
}

/// Number of pages needed for `count` rows.
#[must_use]
pub fn total_pages(count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    count.div_ceil(page_size)
}

/// The rows of 1-based `page`. A page past the end is empty; page 0 is
/// treated as page 1.
#[must_use]
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Inputs of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientQuery {
    /// Search term matched against name, email and address.
    pub search: String,
    /// Sort configuration.
    pub sort: SortConfig,
    /// 1-based page number.
    pub page: usize,
    /// Rows per page.
    pub page_size: usize,
}

impl Default for ClientQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort: SortConfig::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientQuery {
    /// Run filter, sort and paginate over `clients`.
    #[must_use]
    pub fn run<'a>(&self, clients: &'a [Client]) -> Page<'a> {
        let mut matches = filter_clients(clients, &self.search);
        sort_clients(&mut matches, self.sort);

        let total_matches = matches.len();
        let items = paginate(&matches, self.page, self.page_size).to_vec();

        Page {
            items,
            page: self.page.max(1),
            page_size: self.page_size,
            total_pages: total_pages(total_matches, self.page_size),
            total_matches,
        }
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a> {
    /// Clients on this page, in display order.
    pub items: Vec<&'a Client>,
    /// 1-based page number.
    pub page: usize,
    /// Rows per page.
    pub page_size: usize,
    /// Total number of pages.
    pub total_pages: usize,
    /// Number of clients that matched the search.
    pub total_matches: usize,
}

impl Page<'_> {
    /// Whether the page has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 1-based positions of the first and last row within all matches.
    #[must_use]
    pub fn row_range(&self) -> Option<(usize, usize)> {
        if self.items.is_empty() {
            return None;
        }
        let first = (self.page - 1) * self.page_size + 1;
        Some((first, first + self.items.len() - 1))
    }

    /// Whether a previous page exists.
    #[must_use]
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// Whether a next page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Interactive state of the client table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingState {
    query: ClientQuery,
}

impl ListingState {
    /// Create a listing with the default sort and the given page size.
    #[must_use]
    pub fn new(page_size: usize) -> Self {
        Self {
            query: ClientQuery {
                page_size,
                ..ClientQuery::default()
            },
        }
    }

    /// The query the next view will run.
    #[must_use]
    pub fn query(&self) -> &ClientQuery {
        &self.query
    }

    /// Current page number.
    #[must_use]
    pub fn page(&self) -> usize {
        self.query.page
    }

    /// Current sort configuration.
    #[must_use]
    pub fn sort(&self) -> SortConfig {
        self.query.sort
    }

    /// Change the search term. Always returns to the first page.
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.query.search = term.into();
        self.query.page = 1;
    }

    /// Replace the sort configuration.
    pub fn set_sort(&mut self, sort: SortConfig) {
        self.query.sort = sort;
    }

    /// React to the user selecting a sortable column.
    pub fn toggle_sort(&mut self, key: SortKey) {
        self.query.sort = self.query.sort.toggled(key);
    }

    /// Number of pages the current search yields over `clients`.
    #[must_use]
    pub fn total_pages(&self, clients: &[Client]) -> usize {
        total_pages(
            filter_clients(clients, &self.query.search).len(),
            self.query.page_size,
        )
    }

    /// Jump to `page`, clamped to `[1, total_pages]`.
    pub fn go_to(&mut self, page: usize, total_pages: usize) {
        self.query.page = page.clamp(1, total_pages.max(1));
    }

    /// Advance one page, stopping at the last.
    pub fn next_page(&mut self, total_pages: usize) {
        self.go_to(self.query.page.saturating_add(1), total_pages);
    }

    /// Go back one page, stopping at the first.
    pub fn prev_page(&mut self) {
        self.query.page = self.query.page.saturating_sub(1).max(1);
    }

    /// Run the pipeline for the current state.
    #[must_use]
    pub fn view<'a>(&self, clients: &'a [Client]) -> Page<'a> {
        self.query.run(clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{sample_client, Gender};

    fn names(page: &[&Client]) -> Vec<String> {
        page.iter().map(|c| c.full_name.clone()).collect()
    }

    fn numbered_clients(count: usize) -> Vec<Client> {
        (0..count)
            .map(|i| {
                let created_at = i64::try_from(i).unwrap();
                sample_client(&format!("id-{i}"), &format!("Client {i:02}"), created_at)
            })
            .collect()
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let clients = vec![
            sample_client("a", "John Smith", 1),
            sample_client("b", "Jane Doe", 2),
        ];

        let found = filter_clients(&clients, "JOHN");
        assert_eq!(names(&found), vec!["John Smith"]);
    }

    #[test]
    fn test_filter_matches_email_and_address() {
        let mut by_email = sample_client("a", "Amy", 1);
        by_email.email = "contact@acme.io".to_string();
        let mut by_address = sample_client("b", "Bob", 2);
        by_address.address = "9 Acme Road".to_string();
        let mut by_phone = sample_client("c", "Cat", 3);
        by_phone.phone = "5550000000".to_string();

        let clients = vec![by_email, by_address, by_phone];

        assert_eq!(names(&filter_clients(&clients, "acme")), vec!["Amy", "Bob"]);
        // Phone numbers are not searched
        assert!(filter_clients(&clients, "555").is_empty());
    }

    #[test]
    fn test_filter_empty_term_keeps_all() {
        let clients = numbered_clients(3);
        assert_eq!(filter_clients(&clients, "").len(), 3);
    }

    #[test]
    fn test_sort_by_name() {
        let clients = vec![
            sample_client("1", "Bob", 1),
            sample_client("2", "Amy", 2),
            sample_client("3", "Zed", 3),
        ];
        let mut refs: Vec<&Client> = clients.iter().collect();

        sort_clients(&mut refs, SortConfig::new(SortKey::FullName, SortDirection::Asc));
        assert_eq!(names(&refs), vec!["Amy", "Bob", "Zed"]);

        sort_clients(&mut refs, SortConfig::new(SortKey::FullName, SortDirection::Desc));
        assert_eq!(names(&refs), vec!["Zed", "Bob", "Amy"]);
    }

    #[test]
    fn test_sort_created_at_is_numeric() {
        let clients = vec![
            sample_client("1", "Nine", 9),
            sample_client("2", "Ten", 10),
            sample_client("3", "Hundred", 100),
        ];
        let mut refs: Vec<&Client> = clients.iter().collect();

        sort_clients(&mut refs, SortConfig::default());
        assert_eq!(names(&refs), vec!["Hundred", "Ten", "Nine"]);
    }

    #[test]
    fn test_sort_gender_as_text() {
        let mut male = sample_client("1", "M", 1);
        male.gender = Gender::Male;
        let mut female = sample_client("2", "F", 2);
        female.gender = Gender::Female;
        let mut other = sample_client("3", "O", 3);
        other.gender = Gender::Other;

        let clients = vec![other, male, female];
        let mut refs: Vec<&Client> = clients.iter().collect();
        sort_clients(&mut refs, SortConfig::new(SortKey::Gender, SortDirection::Asc));

        assert_eq!(names(&refs), vec!["F", "M", "O"]);
    }

    #[test]
    fn test_sort_missing_values_last_in_both_directions() {
        let mut with_b = sample_client("1", "HasB", 1);
        with_b.avatar = Some("data:b".to_string());
        let without = sample_client("2", "None", 2);
        let mut with_a = sample_client("3", "HasA", 3);
        with_a.avatar = Some("data:a".to_string());

        let clients = vec![without, with_b, with_a];
        let mut refs: Vec<&Client> = clients.iter().collect();

        sort_clients(&mut refs, SortConfig::new(SortKey::Avatar, SortDirection::Asc));
        assert_eq!(names(&refs), vec!["HasA", "HasB", "None"]);

        sort_clients(&mut refs, SortConfig::new(SortKey::Avatar, SortDirection::Desc));
        assert_eq!(names(&refs), vec!["HasB", "HasA", "None"]);
    }

    #[test]
    fn test_sort_ties_keep_filter_order() {
        let clients = vec![
            sample_client("1", "Same", 1),
            sample_client("2", "Same", 2),
            sample_client("3", "Same", 3),
        ];
        let mut refs: Vec<&Client> = clients.iter().collect();
        sort_clients(&mut refs, SortConfig::new(SortKey::FullName, SortDirection::Desc));

        let ids: Vec<&str> = refs.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 5), 0);
        assert_eq!(total_pages(5, 5), 1);
        assert_eq!(total_pages(6, 5), 2);
        assert_eq!(total_pages(12, 5), 3);
        assert_eq!(total_pages(12, 0), 0);
    }

    #[test]
    fn test_paginate_twelve_rows() {
        let rows: Vec<usize> = (0..12).collect();

        assert_eq!(paginate(&rows, 1, 5), &[0, 1, 2, 3, 4]);
        assert_eq!(paginate(&rows, 2, 5), &[5, 6, 7, 8, 9]);
        assert_eq!(paginate(&rows, 3, 5), &[10, 11]);
        assert!(paginate(&rows, 4, 5).is_empty());
        assert_eq!(paginate(&rows, 0, 5), paginate(&rows, 1, 5));
    }

    #[test]
    fn test_query_run() {
        let clients = numbered_clients(12);
        let query = ClientQuery {
            page: 3,
            ..ClientQuery::default()
        };

        let page = query.run(&clients);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_matches, 12);
        // Default sort is newest first, so the last page holds the oldest two
        assert_eq!(names(&page.items), vec!["Client 01", "Client 00"]);
        assert_eq!(page.row_range(), Some((11, 12)));
        assert!(page.has_prev());
        assert!(!page.has_next());
    }

    #[test]
    fn test_query_run_empty() {
        let page = ClientQuery::default().run(&[]);
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.row_range(), None);
        assert!(!page.has_next());
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("fullName".parse::<SortKey>().unwrap(), SortKey::FullName);
        assert_eq!("full_name".parse::<SortKey>().unwrap(), SortKey::FullName);
        assert_eq!("full-name".parse::<SortKey>().unwrap(), SortKey::FullName);
        assert_eq!("CREATEDAT".parse::<SortKey>().unwrap(), SortKey::CreatedAt);
        assert!("salary".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_sort_toggle() {
        let sort = SortConfig::default();

        let sort = sort.toggled(SortKey::FullName);
        assert_eq!(sort, SortConfig::new(SortKey::FullName, SortDirection::Asc));

        let sort = sort.toggled(SortKey::FullName);
        assert_eq!(sort, SortConfig::new(SortKey::FullName, SortDirection::Desc));

        let sort = sort.toggled(SortKey::FullName);
        assert_eq!(sort, SortConfig::new(SortKey::FullName, SortDirection::Asc));

        let sort = sort.toggled(SortKey::Email);
        assert_eq!(sort, SortConfig::new(SortKey::Email, SortDirection::Asc));
    }

    #[test]
    fn test_listing_search_resets_page() {
        let clients = numbered_clients(12);
        let mut listing = ListingState::new(5);
        let total = listing.total_pages(&clients);

        listing.next_page(total);
        listing.next_page(total);
        assert_eq!(listing.page(), 3);

        listing.set_search("client");
        assert_eq!(listing.page(), 1);
    }

    #[test]
    fn test_listing_navigation_clamps() {
        let clients = numbered_clients(12);
        let mut listing = ListingState::new(5);
        let total = listing.total_pages(&clients);

        listing.prev_page();
        assert_eq!(listing.page(), 1);

        listing.go_to(99, total);
        assert_eq!(listing.page(), 3);

        listing.next_page(total);
        assert_eq!(listing.page(), 3);

        listing.go_to(0, total);
        assert_eq!(listing.page(), 1);

        listing.go_to(4, 0);
        assert_eq!(listing.page(), 1);
    }

    #[test]
    fn test_listing_view_uses_state() {
        let clients = vec![
            sample_client("1", "Bob", 1),
            sample_client("2", "Amy", 2),
            sample_client("3", "Zed", 3),
        ];
        let mut listing = ListingState::new(2);

        listing.toggle_sort(SortKey::FullName);
        let page = listing.view(&clients);
        assert_eq!(names(&page.items), vec!["Amy", "Bob"]);
        assert_eq!(page.total_pages, 2);

        listing.set_search("zed");
        let page = listing.view(&clients);
        assert_eq!(names(&page.items), vec!["Zed"]);
    }
}

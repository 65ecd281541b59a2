use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Id of the reserved category that always exists and receives prompts
/// from deleted categories.
pub const UNCATEGORIZED_ID: &str = "uncategorized";

/// Id of the placeholder user a fresh session acts as.
pub const ANONYMOUS_USER_ID: &str = "user_default_anonymous";

pub const DEFAULT_DIFFICULTY: &str = "intermediate";
pub const DEFAULT_LICENSE: &str = "cc-by";
pub const DEFAULT_CATEGORY_ICON: &str = "fas fa-folder";
pub const DEFAULT_CATEGORY_COLOR: &str = "#9c27b0";

fn default_true() -> bool {
    true
}

/// Distinguishes "field absent" (`None`) from "field explicitly null"
/// (`Some(None)`) in patch payloads.
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Reads an explicit `null` as the type's default, like a missing key.
fn null_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Option::unwrap_or_default)
}

// ── Users ──

/// Stored as its lowercase name. Roles this version does not know keep
/// their original spelling so rewriting the users list preserves them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UserRole {
    #[default]
    Guest,
    Member,
    Moderator,
    Admin,
    Other(String),
}

impl UserRole {
    pub fn as_str(&self) -> &str {
        match self {
            UserRole::Guest => "guest",
            UserRole::Member => "member",
            UserRole::Moderator => "moderator",
            UserRole::Admin => "admin",
            UserRole::Other(raw) => raw,
        }
    }
}

impl FromStr for UserRole {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "guest" => UserRole::Guest,
            "member" => UserRole::Member,
            "moderator" => UserRole::Moderator,
            "admin" => UserRole::Admin,
            other => UserRole::Other(other.to_string()),
        })
    }
}

impl Serialize for UserRole {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(de)?;
        raw.parse().map_err(|never: Infallible| match never {})
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default = "Preferences::default_theme")]
    pub theme: String,
    #[serde(default)]
    pub notifications: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Preferences {
    fn default_theme() -> String {
        "dark".to_string()
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Self::default_theme(),
            notifications: false,
            extra: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub username: String,
    #[serde(default, deserialize_with = "null_default")]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub join_date: DateTime<Utc>,
    #[serde(default)]
    pub last_login: DateTime<Utc>,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub prompts_uploaded: u32,
    #[serde(default)]
    pub comments_made: u32,
    #[serde(default)]
    pub outputs_shared: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

// ── Prompts ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    pub version: u32,
    pub content: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub user_id: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub subcategory_id: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "Prompt::default_difficulty")]
    pub difficulty: String,
    #[serde(default = "Prompt::default_license")]
    pub license: String,
    #[serde(default = "default_true")]
    pub allow_edits: bool,
    #[serde(default = "default_true")]
    pub allow_comments: bool,
    #[serde(default = "default_true")]
    pub show_author: bool,
    #[serde(default)]
    pub views: u32,
    #[serde(default)]
    pub favorites_count: u32,
    #[serde(default)]
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub updated_date: DateTime<Utc>,
    #[serde(default)]
    pub version_history: Vec<VersionEntry>,
}

impl Prompt {
    fn default_difficulty() -> String {
        DEFAULT_DIFFICULTY.to_string()
    }

    fn default_license() -> String {
        DEFAULT_LICENSE.to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrompt {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub subcategory_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub allow_edits: Option<bool>,
    #[serde(default)]
    pub allow_comments: Option<bool>,
    #[serde(default)]
    pub show_author: Option<bool>,
}

/// Partial update for a prompt. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<Option<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub allow_edits: Option<bool>,
    #[serde(default)]
    pub allow_comments: Option<bool>,
    #[serde(default)]
    pub show_author: Option<bool>,
    /// Recorded in the version history when `content` changes.
    #[serde(default)]
    pub edit_reason: Option<String>,
}

// ── Categories ──

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum CategoryStatus {
    #[default]
    Pending,
    Approved,
    Official,
    Rejected,
    /// Any status this version does not know about, kept verbatim. Never
    /// matched by a status filter.
    Unknown(String),
}

impl CategoryStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CategoryStatus::Pending => "pending",
            CategoryStatus::Approved => "approved",
            CategoryStatus::Official => "official",
            CategoryStatus::Rejected => "rejected",
            CategoryStatus::Unknown(raw) => raw,
        }
    }

    /// Approved and official categories are the ones shown when browsing.
    pub fn is_public(&self) -> bool {
        matches!(self, CategoryStatus::Approved | CategoryStatus::Official)
    }
}

impl fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => CategoryStatus::Pending,
            "approved" => CategoryStatus::Approved,
            "official" => CategoryStatus::Official,
            "rejected" => CategoryStatus::Rejected,
            other => CategoryStatus::Unknown(other.to_string()),
        })
    }
}

impl Serialize for CategoryStatus {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CategoryStatus {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(de)?;
        raw.parse().map_err(|never: Infallible| match never {})
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default)]
    pub prompt_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default = "Category::default_icon")]
    pub icon: String,
    #[serde(default = "Category::default_color")]
    pub color: String,
    #[serde(default)]
    pub status: CategoryStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub created_by: String,
    #[serde(default)]
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub updated_date: DateTime<Utc>,
    #[serde(default)]
    pub prompt_count: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
}

impl Category {
    fn default_icon() -> String {
        DEFAULT_CATEGORY_ICON.to_string()
    }

    fn default_color() -> String {
        DEFAULT_CATEGORY_COLOR.to_string()
    }

    /// Upvotes minus downvotes.
    pub fn net_score(&self) -> i64 {
        i64::from(self.upvotes) - i64::from(self.downvotes)
    }

    pub fn subcategory(&self, id: &str) -> Option<&Subcategory> {
        self.subcategories.iter().find(|s| s.id == id)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Names of subcategories to create along with the category.
    #[serde(default)]
    pub subcategories: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub status: Option<CategoryStatus>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<Option<String>>,
}

// ── Comments & outputs ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub prompt_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub content: String,
    #[serde(default)]
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub updated_date: DateTime<Utc>,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    pub prompt_id: String,
    pub content: String,
}

/// A sample result someone got from running a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Output {
    pub id: String,
    pub prompt_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub content: String,
    #[serde(default)]
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub updated_date: DateTime<Utc>,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOutput {
    pub prompt_id: String,
    pub content: String,
}

// ── Favorites ──

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub prompt_id: String,
    pub user_id: String,
    #[serde(default)]
    pub date: DateTime<Utc>,
}

// ── Votes ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Category,
    Comment,
    Output,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Category => "category",
            ItemType::Comment => "comment",
            ItemType::Output => "output",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown vote target type: {0}")]
pub struct UnknownItemType(pub String);

impl FromStr for ItemType {
    type Err = UnknownItemType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(ItemType::Category),
            "comment" => Ok(ItemType::Comment),
            "output" => Ok(ItemType::Output),
            other => Err(UnknownItemType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub item_id: String,
    pub item_type: ItemType,
    pub user_id: String,
    pub vote_type: VoteType,
    #[serde(default)]
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCounts {
    pub upvotes: u32,
    pub downvotes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub upvotes: u32,
    pub downvotes: u32,
    pub user_vote: Option<VoteType>,
}

// ── Queries ──

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.eq_ignore_ascii_case("asc") {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        })
    }
}

/// Stored and exchanged as the field name callers use (`"title"`,
/// `"recent"`, `"favoritesCount"`...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PromptSort {
    Title,
    CreatedDate,
    UpdatedDate,
    Views,
    FavoritesCount,
    /// Any other prompt field, compared on its JSON value.
    Field(String),
}

impl fmt::Display for PromptSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PromptSort::Title => "title",
            PromptSort::CreatedDate => "createdDate",
            PromptSort::UpdatedDate => "updatedDate",
            PromptSort::Views => "views",
            PromptSort::FavoritesCount => "favoritesCount",
            PromptSort::Field(field) => field,
        })
    }
}

impl FromStr for PromptSort {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "title" => PromptSort::Title,
            "createdDate" | "recent" => PromptSort::CreatedDate,
            "updatedDate" => PromptSort::UpdatedDate,
            "views" => PromptSort::Views,
            "favoritesCount" => PromptSort::FavoritesCount,
            other => PromptSort::Field(other.to_string()),
        })
    }
}

impl From<String> for PromptSort {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(sort) => sort,
            Err(never) => match never {},
        }
    }
}

impl From<PromptSort> for String {
    fn from(sort: PromptSort) -> Self {
        sort.to_string()
    }
}

/// Prompt listing criteria. Every set field narrows the result; an unset
/// `order` sorts descending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFilter {
    /// `"all"` behaves like no category filter.
    pub category_id: Option<String>,
    pub subcategory_id: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub search: Option<String>,
    pub difficulty: Option<String>,
    pub sort: Option<PromptSort>,
    pub order: Option<SortOrder>,
}

/// Exchanged as `"all_approved"`, `"community_approved"` or a plain status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StatusFilter {
    /// Approved or official.
    AllApproved,
    /// Approved only.
    CommunityApproved,
    Exact(CategoryStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: &CategoryStatus) -> bool {
        match self {
            StatusFilter::AllApproved => status.is_public(),
            StatusFilter::CommunityApproved => *status == CategoryStatus::Approved,
            StatusFilter::Exact(CategoryStatus::Unknown(_)) => false,
            StatusFilter::Exact(wanted) => wanted == status,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::AllApproved => f.write_str("all_approved"),
            StatusFilter::CommunityApproved => f.write_str("community_approved"),
            StatusFilter::Exact(status) => f.write_str(status.as_str()),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all_approved" => StatusFilter::AllApproved,
            "community_approved" => StatusFilter::CommunityApproved,
            other => StatusFilter::Exact(other.parse()?),
        })
    }
}

impl From<String> for StatusFilter {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(filter) => filter,
            Err(never) => match never {},
        }
    }
}

impl From<StatusFilter> for String {
    fn from(filter: StatusFilter) -> Self {
        filter.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySortKey {
    Name,
    PromptCount,
    CreatedDate,
    NetScore,
    Field(String),
}

/// A category sort key plus the order its name implies (`*_desc` keys sort
/// descending, everything else ascending). Exchanged as one string such as
/// `"name_desc"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CategorySort {
    pub key: CategorySortKey,
    pub order: SortOrder,
}

impl fmt::Display for CategorySort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match &self.key {
            CategorySortKey::Name => "name",
            CategorySortKey::PromptCount => "promptCount",
            CategorySortKey::CreatedDate => "createdDate",
            CategorySortKey::NetScore => "score",
            CategorySortKey::Field(field) => field,
        };
        let suffix = match self.order {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        };
        write!(f, "{base}_{suffix}")
    }
}

impl FromStr for CategorySort {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, order) = if let Some(base) = s.strip_suffix("_desc") {
            (base, SortOrder::Desc)
        } else if let Some(base) = s.strip_suffix("_asc") {
            (base, SortOrder::Asc)
        } else {
            (s, SortOrder::Asc)
        };
        let key = match base {
            "name" => CategorySortKey::Name,
            "prompts" | "promptCount" => CategorySortKey::PromptCount,
            "createdDate" | "recent" => CategorySortKey::CreatedDate,
            "upvotes" | "score" => CategorySortKey::NetScore,
            other => CategorySortKey::Field(other.to_string()),
        };
        Ok(CategorySort { key, order })
    }
}

impl From<String> for CategorySort {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(sort) => sort,
            Err(never) => match never {},
        }
    }
}

impl From<CategorySort> for String {
    fn from(sort: CategorySort) -> Self {
        sort.to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFilter {
    pub status: Option<StatusFilter>,
    pub created_by: Option<String>,
    pub search: Option<String>,
    pub sort: Option<CategorySort>,
    /// Overrides the order implied by `sort`.
    pub order: Option<SortOrder>,
}

pub const DEFAULT_PER_PAGE: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
}

impl<T> Paginated<T> {
    /// Cuts one page out of an already filtered and sorted list. Pages are
    /// 1-based; page 0 is treated as page 1.
    pub fn from_items(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = items.len();
        let items = items
            .into_iter()
            .skip((page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();
        Self {
            items,
            total,
            page,
            per_page,
        }
    }

    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.per_page.max(1))
    }
}

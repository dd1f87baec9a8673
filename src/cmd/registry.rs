/*!
CommandRegistry: the static table every dispatch validates against.

One `CommandSpec` per command: required / optional argument names (in the
order they are reported and documented) plus the summary/detail text the
help surfaces render. The dispatcher does not interpret the help text.

`profile` and `format` are universal overrides accepted in any argument
bag in addition to the per-command optionals listed here.
*/

pub struct CommandSpec {
    /// Kebab-case, unique.
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub summary: &'static str,
    pub detail: &'static str,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "list-spaces",
        required: &[],
        optional: &["format"],
        summary: "List all spaces visible to the profile",
        detail: "Fetches every space the authenticated user can see.",
    },
    CommandSpec {
        name: "get-space",
        required: &["spaceKey"],
        optional: &["format"],
        summary: "Show one space by key",
        detail: "Fetches a single space, e.g. get-space spaceKey=DOCS.",
    },
    CommandSpec {
        name: "list-pages",
        required: &[],
        optional: &["spaceKey", "title", "limit", "start", "format"],
        summary: "Search pages, optionally scoped by space and title",
        detail: "CQL is built from the filters you pass: spaceKey scopes to a \
space, title does a contains-match. Without either the search matches all \
pages. limit defaults to 25, start to 0.",
    },
    CommandSpec {
        name: "get-page",
        required: &["pageId"],
        optional: &["format"],
        summary: "Show one page with its storage body and version",
        detail: "Fetches a page by numeric id, including body and version info.",
    },
    CommandSpec {
        name: "create-page",
        required: &["spaceKey", "title", "body"],
        optional: &["parentId", "format"],
        summary: "Create a page in a space",
        detail: "body is storage-format markup. parentId nests the new page \
under an existing one.",
    },
    CommandSpec {
        name: "update-page",
        required: &["pageId", "title", "body", "version"],
        optional: &[],
        summary: "Replace a page's title and body",
        detail: "version is the page's CURRENT version number; the server \
stores the update as version+1. Fetch the page first to read it.",
    },
    CommandSpec {
        name: "add-comment",
        required: &["pageId", "body"],
        optional: &["format"],
        summary: "Add a comment to a page",
        detail: "Posts a storage-format comment under the given page.",
    },
    CommandSpec {
        name: "delete-page",
        required: &["pageId"],
        optional: &[],
        summary: "Delete a page",
        detail: "Moves the page to the space's trash.",
    },
    CommandSpec {
        name: "download-attachment",
        required: &["attachmentId"],
        optional: &["outputPath"],
        summary: "Download an attachment to a local file",
        detail: "Writes the attachment bytes to outputPath, defaulting to the \
attachment's filename in the current directory.",
    },
    CommandSpec {
        name: "get-user",
        required: &[],
        optional: &["accountId", "username", "format"],
        summary: "Look up a user (or the current user)",
        detail: "accountId wins when both identifiers are given; username does \
a display-name search. With neither, shows the authenticated user.",
    },
    CommandSpec {
        name: "test-connection",
        required: &[],
        optional: &[],
        summary: "Verify credentials against the remote API",
        detail: "Fetches the current user to prove host/email/token work.",
    },
];

/// Look up a command by its kebab-case name.
pub fn find(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

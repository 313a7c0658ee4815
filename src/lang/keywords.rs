//! Keyword table.
//!
//! `phf::phf_map!` gives a perfect-hash, case-insensitive keyword lookup.

use phf::phf_map;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    And,
    Or,
    Not,
    Accept,
    Append,
    Average,
    Blank,
    Browse,
    Cancel,
    Case,
    Clear,
    Close,
    Continue,
    Copy,
    Count,
    Create,
    Declare,
    Delete,
    Display,
    Do,
    Edit,
    Else,
    Endcase,
    Enddo,
    Endif,
    Endfor,
    Erase,
    Exit,
    Find,
    For,
    Function,
    Go,
    Goto,
    Help,
    If,
    Index,
    Input,
    Insert,
    List,
    Locate,
    Local,
    Loop,
    Memory,
    Modify,
    Next,
    Note,
    On,
    Order,
    Otherwise,
    Pack,
    Parameters,
    Private,
    Procedure,
    Public,
    Quit,
    Read,
    Recall,
    Reindex,
    Release,
    Replace,
    Report,
    Return,
    Run,
    Say,
    Scope,
    Seek,
    Select,
    Set,
    Skip,
    Sort,
    Store,
    Structure,
    Sum,
    Text,
    To,
    Top,
    Total,
    Type,
    Unlock,
    Use,
    Wait,
    While,
    With,
    Zap,
    All,
    Alias,
    Bottom,
    Databases,
    Deleted,
    Descending,
    Exact,
    Exclusive,
    Fields,
    File,
    Filter,
    From,
    Get,
    Indexes,
    Like,
    Off,
    Record,
    Rest,
    Shared,
    Status,
    Step,
    Tag,
    Unique,
}

pub static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "AND" => Keyword::And,
    "OR" => Keyword::Or,
    "NOT" => Keyword::Not,
    "ACCEPT" => Keyword::Accept,
    "APPEND" => Keyword::Append,
    "AVERAGE" => Keyword::Average,
    "BLANK" => Keyword::Blank,
    "BROWSE" => Keyword::Browse,
    "CANCEL" => Keyword::Cancel,
    "CASE" => Keyword::Case,
    "CLEAR" => Keyword::Clear,
    "CLOSE" => Keyword::Close,
    "CONTINUE" => Keyword::Continue,
    "COPY" => Keyword::Copy,
    "COUNT" => Keyword::Count,
    "CREATE" => Keyword::Create,
    "DECLARE" => Keyword::Declare,
    "DELETE" => Keyword::Delete,
    "DISPLAY" => Keyword::Display,
    "DO" => Keyword::Do,
    "EDIT" => Keyword::Edit,
    "ELSE" => Keyword::Else,
    "ENDCASE" => Keyword::Endcase,
    "ENDDO" => Keyword::Enddo,
    "ENDIF" => Keyword::Endif,
    "ENDFOR" => Keyword::Endfor,
    "ERASE" => Keyword::Erase,
    "EXIT" => Keyword::Exit,
    "FIND" => Keyword::Find,
    "FOR" => Keyword::For,
    "FUNCTION" => Keyword::Function,
    "GO" => Keyword::Go,
    "GOTO" => Keyword::Goto,
    "HELP" => Keyword::Help,
    "IF" => Keyword::If,
    "INDEX" => Keyword::Index,
    "INPUT" => Keyword::Input,
    "INSERT" => Keyword::Insert,
    "LIST" => Keyword::List,
    "LOCATE" => Keyword::Locate,
    "LOCAL" => Keyword::Local,
    "LOOP" => Keyword::Loop,
    "MEMORY" => Keyword::Memory,
    "MODIFY" => Keyword::Modify,
    "NEXT" => Keyword::Next,
    "NOTE" => Keyword::Note,
    "ON" => Keyword::On,
    "ORDER" => Keyword::Order,
    "OTHERWISE" => Keyword::Otherwise,
    "PACK" => Keyword::Pack,
    "PARAMETERS" => Keyword::Parameters,
    "PRIVATE" => Keyword::Private,
    "PROCEDURE" => Keyword::Procedure,
    "PUBLIC" => Keyword::Public,
    "QUIT" => Keyword::Quit,
    "READ" => Keyword::Read,
    "RECALL" => Keyword::Recall,
    "REINDEX" => Keyword::Reindex,
    "RELEASE" => Keyword::Release,
    "REPLACE" => Keyword::Replace,
    "REPORT" => Keyword::Report,
    "RETURN" => Keyword::Return,
    "RUN" => Keyword::Run,
    "SAY" => Keyword::Say,
    "SCOPE" => Keyword::Scope,
    "SEEK" => Keyword::Seek,
    "SELECT" => Keyword::Select,
    "SET" => Keyword::Set,
    "SKIP" => Keyword::Skip,
    "SORT" => Keyword::Sort,
    "STORE" => Keyword::Store,
    "STRUCTURE" => Keyword::Structure,
    "SUM" => Keyword::Sum,
    "TEXT" => Keyword::Text,
    "TO" => Keyword::To,
    "TOP" => Keyword::Top,
    "TOTAL" => Keyword::Total,
    "TYPE" => Keyword::Type,
    "UNLOCK" => Keyword::Unlock,
    "USE" => Keyword::Use,
    "WAIT" => Keyword::Wait,
    "WHILE" => Keyword::While,
    "WITH" => Keyword::With,
    "ZAP" => Keyword::Zap,
    "ALL" => Keyword::All,
    "ALIAS" => Keyword::Alias,
    "BOTTOM" => Keyword::Bottom,
    "DATABASES" => Keyword::Databases,
    "DELETED" => Keyword::Deleted,
    "DESCENDING" => Keyword::Descending,
    "EXACT" => Keyword::Exact,
    "EXCLUSIVE" => Keyword::Exclusive,
    "FIELDS" => Keyword::Fields,
    "FILE" => Keyword::File,
    "FILTER" => Keyword::Filter,
    "FROM" => Keyword::From,
    "GET" => Keyword::Get,
    "INDEXES" => Keyword::Indexes,
    "LIKE" => Keyword::Like,
    "OFF" => Keyword::Off,
    "RECORD" => Keyword::Record,
    "REST" => Keyword::Rest,
    "SHARED" => Keyword::Shared,
    "STATUS" => Keyword::Status,
    "STEP" => Keyword::Step,
    "TAG" => Keyword::Tag,
    "UNIQUE" => Keyword::Unique,
};

pub fn lookup(word: &str) -> Option<Keyword> {
    KEYWORDS.get(word.to_ascii_uppercase().as_str()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(lookup("use"), Some(Keyword::Use));
        assert_eq!(lookup("UsE"), Some(Keyword::Use));
    }

    #[test]
    fn unknown_word_is_none() {
        assert_eq!(lookup("NAME"), None);
    }
}

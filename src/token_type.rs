#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
pub enum TokenType {
    #[strum(to_string = "ILLEGAL")]
    Illegal,
    EOF,

    // literals
    Identifier,
    Number,
    #[strum(to_string = "String")]
    Str,
    #[strum(to_string = "TRUE")]
    True,
    #[strum(to_string = "FALSE")]
    False,
    Array,

    // operators
    #[strum(to_string = "AND")]
    And,
    #[strum(to_string = "OR")]
    Or,
    #[strum(to_string = "XOR")]
    Xor,
    #[strum(to_string = "NAND")]
    Nand,
    #[strum(to_string = "==")]
    EqualEqual,
    #[strum(to_string = "!=")]
    BangEqual,
    #[strum(to_string = "<")]
    Less,
    #[strum(to_string = "<=")]
    LessEqual,
    #[strum(to_string = ">")]
    Greater,
    #[strum(to_string = ">=")]
    GreaterEqual,
    #[strum(to_string = "IN")]
    In,
    #[strum(to_string = "NOT IN")]
    NotIn,
    #[strum(to_string = "=~")]
    Matches,
    #[strum(to_string = "!~")]
    NotMatches,
    #[strum(to_string = "INTERSECTS")]
    Intersects,
    #[strum(to_string = "HAS")]
    Has,

    #[strum(to_string = "(")]
    LeftParen,
    #[strum(to_string = ")")]
    RightParen,
}

impl TokenType {
    /// Binding strength of a binary operator. Higher binds tighter, 0 means the token is not an
    /// operator.
    pub fn precedence(&self) -> u8 {
        match self {
            TokenType::Or => 1,
            TokenType::And | TokenType::Xor | TokenType::Nand => 2,
            TokenType::EqualEqual
            | TokenType::BangEqual
            | TokenType::Less
            | TokenType::LessEqual
            | TokenType::Greater
            | TokenType::GreaterEqual
            | TokenType::In
            | TokenType::NotIn
            | TokenType::Matches
            | TokenType::NotMatches
            | TokenType::Intersects
            | TokenType::Has => 3,
            _ => 0,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.precedence() > 0
    }

    /// Maps a reserved word (already upper-cased) to its token type. `NOT` is handled by the
    /// scanner since it needs the following word.
    pub fn keyword(word: &str) -> Option<TokenType> {
        let variant = match word {
            "AND" => TokenType::And,
            "OR" => TokenType::Or,
            "XOR" => TokenType::Xor,
            "NAND" => TokenType::Nand,
            "IN" => TokenType::In,
            "INTERSECTS" => TokenType::Intersects,
            "HAS" => TokenType::Has,
            "TRUE" => TokenType::True,
            "FALSE" => TokenType::False,
            _ => return None,
        };
        Some(variant)
    }
}

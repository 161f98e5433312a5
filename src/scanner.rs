use std::fmt;
use std::ops::Range;

use crate::config::ParserConfig;
use crate::error::Position;
use crate::token_type::TokenType::{self, *};

/// Position of the scanner inside the source. Cloned to rewind when a bracket body turns out
/// to be a list instead of a variable path.
#[derive(Clone)]
struct Cursor<'a> {
    chars: std::str::CharIndices<'a>, // iterator over chars of source
    current: Option<(usize, char)>,   // current char (byte index, char)
    next: Option<(usize, char)>,      // next char (byte index, char)
    offset: usize,                    // char offset of current
    line: usize,
    column: usize,
}

enum PathScan {
    Found(String),
    NotAPath, // rewind and read the bracket as a list
    Broken,
}

/// The `Scanner` walks through the condition text and hands out one token per call to
/// `next()`. A single token can be pushed back and will be returned again by the following
/// `next()`.
pub struct Scanner<'a> {
    source: &'a str,
    config: &'a ParserConfig,
    cursor: Cursor<'a>,
    start: Cursor<'a>,             // start of lexeme
    previous: Option<Token>,       // most recently returned token
    pushed_back: Option<Token>,    // single-slot pushback buffer
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, config: &'a ParserConfig) -> Self {
        let mut chars = source.char_indices();
        let current = chars.next();
        let next = chars.clone().next();
        let cursor = Cursor {
            chars,
            current,
            next,
            offset: 0,
            line: 1,
            column: 1,
        };

        Scanner {
            source,
            config,
            start: cursor.clone(),
            cursor,
            previous: None,
            pushed_back: None,
        }
    }

    /// Returns the next token. Malformed input is returned as an `Illegal` token carrying the
    /// offending text; the end of input is returned as `EOF` on every further call.
    pub fn next(&mut self) -> Token {
        let token = match self.pushed_back.take() {
            Some(token) => token,
            None => self.scan_token(),
        };
        log::trace!("scanned {}", token);
        self.previous = Some(token.clone());
        token
    }

    /// Un-reads the most recently returned token. The buffer holds exactly one token: a second
    /// call without an intervening `next()`, or a call before any token was read, does nothing.
    pub fn pushback(&mut self) {
        if self.pushed_back.is_some() {
            log::warn!("pushback called twice without reading a token in between, ignoring");
            return;
        }
        match self.previous.take() {
            Some(token) => self.pushed_back = Some(token),
            None => log::warn!("pushback called before any token was read, ignoring"),
        }
    }

    fn scan_token(&mut self) -> Token {
        self.skip_whitespace();
        self.start = self.cursor.clone();

        let c = match self.advance() {
            Some(ch) => ch,
            None => return self.make_token(EOF, String::new(), None),
        };

        match c {
            '(' => self.add_token(LeftParen),
            ')' => self.add_token(RightParen),
            '[' => self.bracket(),
            '"' => self.string('"', true),
            '`' => self.string('`', false),
            '/' => self.pattern(),
            '!' => self.match_two(&[('=', BangEqual), ('~', NotMatches)], None),
            '=' => self.match_two(&[('=', EqualEqual), ('~', Matches)], None),
            '<' => self.match_two(&[('=', LessEqual)], Some(Less)),
            '>' => self.match_two(&[('=', GreaterEqual)], Some(Greater)),
            '-' => {
                if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.number()
                } else {
                    self.add_token(Illegal)
                }
            }
            _ if c.is_ascii_digit() => self.number(),
            _ if Self::is_alpha(c) => self.word(),
            _ => self.add_token(Illegal),
        }
    }

    /// Two-character operators. Without a matching second char the `single` fallback is used and
    /// the lookahead char stays unconsumed; without a fallback the lexeme is illegal.
    fn match_two(&mut self, pairs: &[(char, TokenType)], single: Option<TokenType>) -> Token {
        for (expected, token_type) in pairs {
            if self.match_char(*expected) {
                return self.add_token(*token_type);
            }
        }
        match single {
            Some(token_type) => self.add_token(token_type),
            None => {
                // report the char that broke the operator too
                self.advance();
                self.add_token(Illegal)
            }
        }
    }

    fn number(&mut self) -> Token {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        // Fractional part
        if let (Some('.'), Some(c_next)) = (self.peek(), self.peek_next()) {
            if c_next.is_ascii_digit() {
                self.advance(); // consume the '.'
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }

        // Exponent
        if let Some('e' | 'E') = self.peek() {
            let rewind = self.cursor.clone();
            self.advance();
            if let Some('+' | '-') = self.peek() {
                self.advance();
            }
            if matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.advance();
                }
            } else {
                self.cursor = rewind;
            }
        }

        let lexeme = self.lexeme().to_string();
        match lexeme.parse::<f64>() {
            Ok(value) => self.make_token(Number, lexeme, Some(Literal::Number(value))),
            Err(_) => self.make_token(Illegal, lexeme, None),
        }
    }

    /// Quoted string. The quotes are stripped and the content is kept verbatim; with `escapes`
    /// a backslash protects the following char from ending the string.
    fn string(&mut self, quote: char, escapes: bool) -> Token {
        loop {
            match self.advance() {
                None => return self.add_token(Illegal),
                Some('\\') if escapes => {
                    if self.advance().is_none() {
                        return self.add_token(Illegal);
                    }
                }
                Some(c) if c == quote => break,
                Some('\n') if quote == '"' => return self.add_token(Illegal),
                Some(_) => {}
            }
        }

        let lexeme = self.lexeme();
        let content = lexeme[1..lexeme.len() - quote.len_utf8()].to_string();
        self.make_token(Str, content.clone(), Some(Literal::Str(content)))
    }

    /// `/pattern/` literal, read verbatim up to the closing slash. `\/` stands for a slash.
    fn pattern(&mut self) -> Token {
        let mut content = String::new();
        loop {
            match self.advance() {
                None => return self.add_token(Illegal),
                Some('/') => break,
                Some('\\') if self.peek() == Some('/') => {
                    self.advance();
                    content.push('/');
                }
                Some(c) => content.push(c),
            }
        }
        self.make_token(Str, content.clone(), Some(Literal::Str(content)))
    }

    /// Reserved words, `NOT IN`, and bare identifiers.
    fn word(&mut self) -> Token {
        self.consume_identifier();
        let word = self.lexeme().to_string();
        let upper = word.to_uppercase();

        if let Some(token_type) = TokenType::keyword(&upper) {
            return self.make_token(token_type, word, None);
        }

        if upper == "NOT" {
            let rewind = self.cursor.clone();
            self.skip_whitespace();
            let word_start = self.cursor.clone();
            if matches!(self.peek(), Some(c) if Self::is_alpha(c)) {
                self.consume_identifier();
                let next_word = self.slice(&word_start, &self.cursor);
                if next_word.eq_ignore_ascii_case("IN") {
                    return self.make_token(NotIn, "NOT IN".to_string(), None);
                }
            }
            self.cursor = rewind;
            return self.make_token(Illegal, word, None);
        }

        if self.config.accepts_bare_identifier(&word) {
            self.make_token(Identifier, word, None)
        } else {
            self.make_token(Illegal, word, None)
        }
    }

    /// A bracket opens either a variable path (`[a][b]` -> `a.b`) or a list literal. The path is
    /// tried first; on failure the scanner rewinds to just after the `[` and reads the body as a
    /// list instead.
    fn bracket(&mut self) -> Token {
        let body_start = self.cursor.clone();
        match self.variable_path() {
            PathScan::Found(path) => return self.make_token(Identifier, path, None),
            PathScan::Broken => return self.add_token(Illegal),
            PathScan::NotAPath => {}
        }

        self.cursor = body_start.clone();
        let mut quote = None;
        loop {
            match (self.advance(), quote) {
                (None, _) => return self.add_token(Illegal),
                (Some('\\'), Some(_)) => {
                    self.advance();
                }
                (Some(c), Some(q)) if c == q => quote = None,
                (Some(c @ ('"' | '`')), None) => quote = Some(c),
                (Some(']'), None) => break,
                (Some(_), _) => {}
            }
        }

        // the body excludes the closing ']'
        let close = self.byte_index(&self.cursor) - ']'.len_utf8();
        let body = self.source[self.byte_index(&body_start)..close].to_string();
        self.make_token(Array, body, None)
    }

    /// Reads `name]`, `@name]`, and adjacent `[segment]` continuations. A chained segment may
    /// start with a digit (`[items][0]` -> `items.0`); only the first one has to look like a
    /// name, so `[5]` stays a list. A failure inside the first segment hands the bracket back to
    /// the caller as a possible list; a failure after `][` is an illegal path.
    fn variable_path(&mut self) -> PathScan {
        let mut segments: Vec<String> = Vec::new();
        loop {
            let chained = !segments.is_empty();
            let fail = if chained { PathScan::Broken } else { PathScan::NotAPath };

            self.skip_whitespace();
            let marker = self.match_char('@');
            let segment_start = self.cursor.clone();
            match self.peek() {
                Some(c) if Self::is_alpha(c) => {}
                Some(c) if chained && c.is_ascii_digit() => {}
                _ => return fail,
            }
            self.consume_identifier();
            let segment = self.slice(&segment_start, &self.cursor);
            segments.push(if marker { format!("@{}", segment) } else { segment.to_string() });

            self.skip_whitespace();
            if !self.match_char(']') {
                return fail;
            }
            if !self.match_char('[') {
                return PathScan::Found(segments.join("."));
            }
        }
    }

    fn consume_identifier(&mut self) {
        while let Some(c) = self.peek() {
            if Self::is_alphanumeric(c) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.advance();
        }
    }

    fn byte_index(&self, cursor: &Cursor) -> usize {
        cursor.current.map(|(idx, _)| idx).unwrap_or(self.source.len())
    }

    fn slice(&self, from: &Cursor, to: &Cursor) -> &'a str {
        &self.source[self.byte_index(from)..self.byte_index(to)]
    }

    /// Extracts the string slice of the current lexeme.
    fn lexeme(&self) -> &'a str {
        self.slice(&self.start, &self.cursor)
    }

    fn is_alpha(c: char) -> bool {
        c.is_alphabetic() || c == '_'
    }

    fn is_alphanumeric(c: char) -> bool {
        c.is_alphanumeric() || c == '_'
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            return true;
        }
        false
    }

    /// Return current char and advance to next.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        let cursor = &mut self.cursor;
        cursor.current = cursor.next;
        cursor.chars.next();
        cursor.next = cursor.chars.clone().next();
        cursor.offset += 1;
        if c == '\n' {
            cursor.line += 1;
            cursor.column = 1;
        } else {
            cursor.column += 1;
        }
        Some(c)
    }

    /// Return current char without advancing.
    fn peek(&self) -> Option<char> {
        self.cursor.current.map(|(_, c)| c)
    }

    /// Return next char without advancing.
    fn peek_next(&self) -> Option<char> {
        self.cursor.next.map(|(_, c)| c)
    }

    fn add_token(&self, token_type: TokenType) -> Token {
        self.make_token(token_type, self.lexeme().to_string(), None)
    }

    fn make_token(&self, token_type: TokenType, lexeme: String, literal: Option<Literal>) -> Token {
        Token {
            variant: token_type,
            lexeme,
            literal,
            line: self.start.line,
            column: self.start.column,
            span: self.start.offset..self.cursor.offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub variant: TokenType,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
    pub column: usize,
    pub span: Range<usize>,
}

impl Token {
    pub fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            span: self.span.clone(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        write!(f, "{} {}", self.variant, self.lexeme)?;
        if let Some(literal) = &self.literal {
            write!(f, " {}", literal)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Literal::Number(value) => write!(f, "{}", value),
            Literal::Str(value) => write!(f, "{:?}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(source: &str, config: &ParserConfig) -> Vec<(TokenType, String)> {
        let mut scanner = Scanner::new(source, config);
        let mut tokens = Vec::new();
        loop {
            let token = scanner.next();
            if token.variant == EOF {
                break;
            }
            tokens.push((token.variant, token.lexeme));
        }
        tokens
    }

    fn scan(source: &str) -> Vec<(TokenType, String)> {
        scan_all(source, &ParserConfig::default())
    }

    fn variants(source: &str) -> Vec<TokenType> {
        scan(source).into_iter().map(|(variant, _)| variant).collect()
    }

    #[test]
    fn test_operators() {
        let cases = vec![
            ("==", EqualEqual),
            ("!=", BangEqual),
            ("=~", Matches),
            ("!~", NotMatches),
            (">=", GreaterEqual),
            ("<=", LessEqual),
            (">", Greater),
            ("<", Less),
            ("and", And),
            ("Or", Or),
            ("XOR", Xor),
            ("nand", Nand),
            ("in", In),
            ("not in", NotIn),
            ("NOT   IN", NotIn),
            ("intersects", Intersects),
            ("HAS", Has),
            ("TRUE", True),
            ("false", False),
            ("(", LeftParen),
            (")", RightParen),
        ];

        for (source, expected) in cases {
            assert_eq!(variants(source), vec![expected], "source: {}", source);
        }
    }

    #[test]
    fn test_single_char_comparison_keeps_lookahead() {
        assert_eq!(variants("<5"), vec![Less, Number]);
        assert_eq!(variants(">(true)"), vec![Greater, LeftParen, True, RightParen]);
    }

    #[test]
    fn test_illegal_input() {
        let cases = vec!["=", "!", "!x", "not", "not and", "-", "- 5", "'DEMO'", "#", "\"open", "/open", "@foo", "DEMO"];
        for source in cases {
            let tokens = scan(source);
            assert_eq!(tokens.first().map(|(v, _)| *v), Some(Illegal), "source: {}", source);
        }
    }

    #[test]
    fn test_not_without_in_keeps_following_word() {
        assert_eq!(scan("NOT true"), vec![(Illegal, "NOT".to_string()), (True, "true".to_string())]);
    }

    #[test]
    fn test_numbers() {
        let cases = vec![("42", 42.0), ("-75.4", -75.4), ("0.5", 0.5), ("1e3", 1000.0), ("-2.5E-1", -0.25)];
        let config = ParserConfig::default();
        for (source, expected) in cases {
            let token = Scanner::new(source, &config).next();
            assert_eq!(token.variant, Number, "source: {}", source);
            assert_eq!(token.literal, Some(Literal::Number(expected)), "source: {}", source);
        }
    }

    #[test]
    fn test_strings() {
        assert_eq!(scan("\"OFF\""), vec![(Str, "OFF".to_string())]);
        assert_eq!(scan("`ON`"), vec![(Str, "ON".to_string())]);
        assert_eq!(scan(r#""say \"hi\"""#), vec![(Str, r#"say \"hi\""#.to_string())]);
        assert_eq!(scan("``"), vec![(Str, String::new())]);
    }

    #[test]
    fn test_pattern_is_verbatim() {
        assert_eq!(scan(r"/^5\d\d/"), vec![(Str, r"^5\d\d".to_string())]);
        assert_eq!(scan(r"/a b  c/"), vec![(Str, "a b  c".to_string())]);
        assert_eq!(scan(r"/a\/b/"), vec![(Str, "a/b".to_string())]);
    }

    #[test]
    fn test_variable_paths() {
        let cases = vec![
            ("[var0]", "var0"),
            ("[ status ]", "status"),
            ("[foo][dfs]", "foo.dfs"),
            ("[foo][dfs][a]", "foo.dfs.a"),
            ("[@foo][a]", "@foo.a"),
            ("[foo][@bar]", "foo.@bar"),
            ("[_x1]", "_x1"),
            ("[items][0]", "items.0"),
            ("[items][0][name]", "items.0.name"),
        ];
        for (source, expected) in cases {
            assert_eq!(scan(source), vec![(Identifier, expected.to_string())], "source: {}", source);
        }
    }

    #[test]
    fn test_separated_brackets_are_not_chained() {
        assert_eq!(
            scan("[foo] [bar]"),
            vec![(Identifier, "foo".to_string()), (Identifier, "bar".to_string())]
        );
    }

    #[test]
    fn test_bracket_falls_back_to_list() {
        let cases = vec![
            (r#"["hello", "world"]"#, r#""hello", "world""#),
            ("[1, 2.5, -3]", "1, 2.5, -3"),
            ("[5]", "5"),
            ("[]", ""),
            (r#"["a]b"]"#, r#""a]b""#),
            ("[foo bar]", "foo bar"),
        ];
        for (source, expected) in cases {
            assert_eq!(scan(source), vec![(Array, expected.to_string())], "source: {}", source);
        }
    }

    #[test]
    fn test_unterminated_bracket_is_illegal() {
        assert_eq!(variants("[foo"), vec![Illegal]);
        assert_eq!(variants("[1, 2"), vec![Illegal]);
    }

    #[test]
    fn test_broken_chained_segment_is_illegal() {
        let tokens = scan("[x][1, 2]");
        assert_eq!(tokens[0], (Illegal, "[x][1".to_string()));

        assert_eq!(scan("[foo][bar"), vec![(Illegal, "[foo][bar".to_string())]);
    }

    #[test]
    fn test_bare_identifiers_follow_config() {
        assert_eq!(variants("C1 == P2"), vec![Illegal, EqualEqual, Illegal]);

        let legacy = ParserConfig::legacy();
        assert_eq!(
            scan_all("C1 == p2", &legacy),
            vec![
                (Identifier, "C1".to_string()),
                (EqualEqual, "==".to_string()),
                (Identifier, "p2".to_string())
            ]
        );
        assert_eq!(scan_all("A", &legacy), vec![(Illegal, "A".to_string())]);
    }

    #[test]
    fn test_full_condition() {
        assert_eq!(
            variants(r#"([status] > 10) AND ([mode] == "OFF")"#),
            vec![LeftParen, Identifier, Greater, Number, RightParen, And, LeftParen, Identifier, EqualEqual, Str, RightParen]
        );
    }

    #[test]
    fn test_pushback_returns_same_token() {
        let config = ParserConfig::default();
        let mut scanner = Scanner::new("true AND false", &config);
        let first = scanner.next();
        scanner.pushback();
        assert_eq!(scanner.next(), first);
        assert_eq!(scanner.next().variant, And);
    }

    #[test]
    fn test_double_pushback_is_noop() {
        let config = ParserConfig::default();
        let mut scanner = Scanner::new("true AND false", &config);
        scanner.next();
        let second = scanner.next();
        scanner.pushback();
        scanner.pushback();
        assert_eq!(scanner.next(), second);
        assert_eq!(scanner.next().variant, False);
        assert_eq!(scanner.next().variant, EOF);
        assert_eq!(scanner.next().variant, EOF);
    }

    #[test]
    fn test_pushback_before_next_is_noop() {
        let config = ParserConfig::default();
        let mut scanner = Scanner::new("true", &config);
        scanner.pushback();
        assert_eq!(scanner.next().variant, True);
    }

    #[test]
    fn test_positions() {
        let config = ParserConfig::default();
        let mut scanner = Scanner::new("true\n  AND [x]", &config);
        let first = scanner.next();
        assert_eq!((first.line, first.column, first.span.clone()), (1, 1, 0..4));
        let and = scanner.next();
        assert_eq!((and.line, and.column, and.span.clone()), (2, 3, 7..10));
        let var = scanner.next();
        assert_eq!((var.line, var.column, var.span.clone()), (2, 7, 11..14));
    }
}

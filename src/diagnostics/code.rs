//! The closed catalog of diagnostic codes, per spec §6's "two-letter-prefix + three-digit"
//! convention: `P` lexical/syntactic (parser), `C` type-check, `B` overload/binding, `R`
//! resolution, `D` directives, `S` style/warnings.

use super::Severity;

/// A stable, greppable diagnostic code. Each variant owns a default message and severity; callers
/// can override the message via [`super::DiagnosticBuilder::message`] without changing the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    // Lexical (L0xx)
    L001IllegalUtf8,
    L002UnterminatedString,
    L003UnterminatedChar,
    L004UnterminatedBlockComment,
    L005UnterminatedRawBlock,
    L006InvalidEscape,
    L007NoRecognizer,

    // Syntactic (P0xx)
    P019UnexpectedToken,
    P020MissingSemicolon,
    P021UnbalancedDelimiter,
    P022InvalidNumericLiteral,
    P023RecursionLimit,

    // Resolution (R0xx)
    R030UndefinedIdentifier,
    R031AmbiguousSymbol,
    R032CircularNamespace,
    R033DuplicateTypeName,
    R034DuplicateIdentifier,

    // Type (C0xx)
    C050AssignmentMismatch,
    C051TypeMismatch,
    C052NarrowingOverflow,
    C053FamilyConstraintViolated,
    C054CastInvalid,

    // Overload (B0xx)
    B020NoMatchingOverload,
    B021AmbiguousCallSite,
    B022BadNamedArgument,

    // Directive (D0xx)
    D040UnknownDirective,
    D041InvalidDirectiveArgument,
    D042NonConstantContext,

    // Style / warnings (S0xx)
    S001UnusedSymbol,
    S002UnreachableCode,
}

impl DiagnosticCode {
    /// Two-letter-prefix + three-digit code as rendered to users, e.g. `"P019"`.
    pub fn as_str(self) -> &'static str {
        use DiagnosticCode::*;
        match self {
            L001IllegalUtf8 => "L001",
            L002UnterminatedString => "L002",
            L003UnterminatedChar => "L003",
            L004UnterminatedBlockComment => "L004",
            L005UnterminatedRawBlock => "L005",
            L006InvalidEscape => "L006",
            L007NoRecognizer => "L007",
            P019UnexpectedToken => "P019",
            P020MissingSemicolon => "P020",
            P021UnbalancedDelimiter => "P021",
            P022InvalidNumericLiteral => "P022",
            P023RecursionLimit => "P023",
            R030UndefinedIdentifier => "R030",
            R031AmbiguousSymbol => "R031",
            R032CircularNamespace => "R032",
            R033DuplicateTypeName => "R033",
            R034DuplicateIdentifier => "R034",
            C050AssignmentMismatch => "C050",
            C051TypeMismatch => "C051",
            C052NarrowingOverflow => "C052",
            C053FamilyConstraintViolated => "C053",
            C054CastInvalid => "C054",
            B020NoMatchingOverload => "B020",
            B021AmbiguousCallSite => "B021",
            B022BadNamedArgument => "B022",
            D040UnknownDirective => "D040",
            D041InvalidDirectiveArgument => "D041",
            D042NonConstantContext => "D042",
            S001UnusedSymbol => "S001",
            S002UnreachableCode => "S002",
        }
    }

    pub fn severity(self) -> Severity {
        use DiagnosticCode::*;
        match self {
            S001UnusedSymbol | S002UnreachableCode => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn default_message(self) -> &'static str {
        use DiagnosticCode::*;
        match self {
            L001IllegalUtf8 => "illegal UTF-8 sequence",
            L002UnterminatedString => "unterminated string literal",
            L003UnterminatedChar => "unterminated character literal",
            L004UnterminatedBlockComment => "unterminated block comment",
            L005UnterminatedRawBlock => "unterminated raw block",
            L006InvalidEscape => "invalid escape sequence",
            L007NoRecognizer => "no recognizer matched at this position",
            P019UnexpectedToken => "unexpected token",
            P020MissingSemicolon => "expected `;`",
            P021UnbalancedDelimiter => "unbalanced delimiter",
            P022InvalidNumericLiteral => "invalid numeric literal",
            P023RecursionLimit => "expression nested too deeply",
            R030UndefinedIdentifier => "undefined identifier",
            R031AmbiguousSymbol => "ambiguous symbol",
            R032CircularNamespace => "circular namespace reference",
            R033DuplicateTypeName => "duplicate type name in scope",
            R034DuplicateIdentifier => "duplicate identifier in scope",
            C050AssignmentMismatch => "type mismatch in assignment",
            C051TypeMismatch => "type mismatch",
            C052NarrowingOverflow => "value does not fit in target type",
            C053FamilyConstraintViolated => "type does not satisfy family constraint",
            C054CastInvalid => "invalid cast",
            B020NoMatchingOverload => "no matching overload",
            B021AmbiguousCallSite => "ambiguous call site",
            B022BadNamedArgument => "no such named parameter",
            D040UnknownDirective => "unknown directive",
            D041InvalidDirectiveArgument => "invalid directive argument",
            D042NonConstantContext => "expression in this position must be constant",
            S001UnusedSymbol => "unused symbol",
            S002UnreachableCode => "unreachable code",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_two_letter_prefix_three_digit() {
        for code in [
            DiagnosticCode::P019UnexpectedToken,
            DiagnosticCode::C051TypeMismatch,
            DiagnosticCode::B021AmbiguousCallSite,
        ] {
            let s = code.as_str();
            assert_eq!(s.len(), 4);
            assert!(s.chars().next().unwrap().is_ascii_uppercase());
            assert!(s[1..].chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn warnings_have_warning_severity() {
        assert_eq!(DiagnosticCode::S001UnusedSymbol.severity(), Severity::Warning);
        assert_eq!(DiagnosticCode::P019UnexpectedToken.severity(), Severity::Error);
    }
}

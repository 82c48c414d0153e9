use super::{Pointer, RED, RESET};
use crate::{region::Region, report::Visual};
use std::fmt::{Debug, Display, Formatter, Result};

/// Broad category of an [`Error`].
///
/// Callers branch on the kind to decide between a fallback and propagation,
/// for example skipping a missing optional section while still failing on a
/// broken expression.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// The template source could not be parsed.
    Syntax,
    /// Malformed input was handed to an operation, such as a non-mapping
    /// given to `add_all`.
    InvalidArgument,
    /// A named lookup (section, named child) found nothing.
    ChildNotFound,
    /// No helper is registered under the requested name.
    HelperNotFound,
    /// A node that was found failed while it was being evaluated.
    Evaluation,
    /// Writing rendered output failed.
    Write,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            ErrorKind::Syntax => write!(f, "syntax"),
            ErrorKind::InvalidArgument => write!(f, "invalid argument"),
            ErrorKind::ChildNotFound => write!(f, "child not found"),
            ErrorKind::HelperNotFound => write!(f, "helper not found"),
            ErrorKind::Evaluation => write!(f, "evaluation"),
            ErrorKind::Write => write!(f, "write"),
        }
    }
}

/// Describes an error, and allows adding a contextual help text and visualization.
///
/// # Examples
///
/// Creating an [`Error`] that includes a [`Visual`] of type [`Pointer`]:
///
/// ```
/// use stencil::{Error, ErrorKind, Region};
///
/// let error = Error::syntax("unexpected keyword")
///     .with_pointer("{% update name %}", Region::new(3..9))
///     .with_name("template.html")
///     .with_help(r#"expected one of "if", "let", "for""#);
///
/// assert_eq!(error.kind(), ErrorKind::Syntax);
/// ```
///
/// When printed with `println!("{:#}", error)` the [`Error`] produces this output:
///
/// ```text
/// error: unexpected keyword
///   --> template.html:1:4
///    |
///  1 | {% update name %}
///    |    ^^^^^^
///    |
///   = help: expected one of "if", "let", "for"
/// ```
pub struct Error {
    /// Category used by callers to pick a recovery strategy.
    kind: ErrorKind,
    /// Describes the cause of the [`Error`].
    reason: String,
    /// A visualization to help illustrate the [`Error`].
    visual: Option<Box<dyn Visual>>,
    /// Additional information to display with the [`Error`].
    help: Option<String>,
    /// The name of the template that the [`Error`] comes from.
    name: Option<String>,
    /// Location in the template source, used to build a visual once the
    /// source is known.
    region: Option<Region>,
}

impl Error {
    /// Create a new [`Error`] of the given kind.
    pub fn new<T>(kind: ErrorKind, reason: T) -> Self
    where
        T: Into<String>,
    {
        Error {
            kind,
            reason: reason.into(),
            visual: None,
            help: None,
            name: None,
            region: None,
        }
    }

    /// Create a new [`ErrorKind::Evaluation`] error with the given reason text.
    ///
    /// This is the constructor helpers use to report failures.
    ///
    /// # Examples
    ///
    /// ```
    /// use stencil::Error;
    ///
    /// Error::build("helper `upper` requires string input")
    ///     .with_help("use quotes to coerce data to string");
    /// ```
    pub fn build<T>(reason: T) -> Self
    where
        T: Into<String>,
    {
        Self::new(ErrorKind::Evaluation, reason)
    }

    /// Create a new [`ErrorKind::Syntax`] error.
    pub fn syntax<T>(reason: T) -> Self
    where
        T: Into<String>,
    {
        Self::new(ErrorKind::Syntax, reason)
    }

    /// Create a new [`ErrorKind::InvalidArgument`] error.
    pub fn invalid_argument<T>(reason: T) -> Self
    where
        T: Into<String>,
    {
        Self::new(ErrorKind::InvalidArgument, reason)
    }

    /// Create a new [`ErrorKind::ChildNotFound`] error for the named child.
    pub fn child_not_found(name: &str) -> Self {
        Self::new(ErrorKind::ChildNotFound, super::MISSING_CHILD)
            .with_help(format!("no child named `{name}` exists in this template"))
    }

    /// Create a new [`ErrorKind::HelperNotFound`] error for the named helper.
    pub fn helper_not_found(name: &str) -> Self {
        Self::new(ErrorKind::HelperNotFound, super::UNKNOWN_HELPER).with_help(format!(
            "template wants to use the `{name}` helper, but a helper with that name was not \
            found, did you register it with `.add_helper` or `.add_helper_must`?"
        ))
    }

    /// Set the reason text, which is a short summary of the [`Error`].
    pub fn with_reason<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.reason = text.into();

        self
    }

    /// Set the name of the template that the [`Error`] is related to.
    pub fn with_name<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.name = Some(text.into());

        self
    }

    /// Set the [`Visual`], which is a visualization that helps illustrate the
    /// cause of the error.
    pub fn with_visual(mut self, visual: impl Visual + 'static) -> Self {
        self.visual = Some(Box::new(visual));

        self
    }

    /// Set the visualization to a new [`Pointer`] with the given source text and
    /// [`Region`].
    pub fn with_pointer<T>(mut self, source: &str, region: T) -> Self
    where
        T: Into<Region>,
    {
        let region = region.into();
        self.visual = Some(Box::new(Pointer::new(source, region)));
        self.region = Some(region);

        self
    }

    /// Set the help text, which is contextual information to accompany the
    /// reason text.
    pub fn with_help<T>(mut self, text: T) -> Self
    where
        T: Into<String>,
    {
        self.help = Some(text.into());

        self
    }

    /// Remember where in the template the [`Error`] happened.
    ///
    /// An existing region is kept, so the innermost location wins.
    pub fn with_region(mut self, region: Region) -> Self {
        if self.region.is_none() {
            self.region = Some(region);
        }

        self
    }

    /// Attach a [`Pointer`] built from the stored region, unless a visual is
    /// already present.
    pub(crate) fn locate(mut self, source: &str) -> Self {
        if self.visual.is_none() {
            if let Some(region) = self.region {
                if region.end <= source.len() {
                    self.visual = Some(Box::new(Pointer::new(source, region)));
                }
            }
        }

        self
    }

    /// Return the [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return true for [`ErrorKind::ChildNotFound`].
    pub fn is_child_not_found(&self) -> bool {
        self.kind == ErrorKind::ChildNotFound
    }

    /// Return the reason text.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Return the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Return the name of the template that the error is related to.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Return the location of the error in the template source, if known.
    pub fn region(&self) -> Option<Region> {
        self.region
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        if !f.alternate() {
            writeln!(f, "{self:#}")?;
        }
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("reason", &self.reason)
            .field("name", &self.name)
            .field("visual", &self.visual)
            .field("help", &self.help)
            .finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{RED}error{RESET}: {}", self.reason)?;

        if f.alternate() {
            if let Some(visual) = &self.visual {
                return visual.display(f, self.name.as_deref(), self.help.as_deref());
            }
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.reason == other.reason
            && self.help == other.help
            && self.name == other.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_constructors() {
        assert_eq!(Error::build("x").kind(), ErrorKind::Evaluation);
        assert_eq!(Error::syntax("x").kind(), ErrorKind::Syntax);
        assert_eq!(Error::invalid_argument("x").kind(), ErrorKind::InvalidArgument);
        assert!(Error::child_not_found("footer").is_child_not_found());
        assert_eq!(
            Error::helper_not_found("shout").kind(),
            ErrorKind::HelperNotFound
        );
    }

    #[test]
    fn test_region_innermost_wins() {
        let error = Error::build("x")
            .with_region(Region::new(3..5))
            .with_region(Region::new(0..9));

        assert_eq!(error.region(), Some(Region::new(3..5)));
    }

    #[test]
    fn test_locate_attaches_pointer() {
        let source = "{{ name | shout }}";
        let error = Error::helper_not_found("shout")
            .with_region(Region::new(10..15))
            .with_name("greeting.html")
            .locate(source);
        let printed = format!("{error:#}");

        assert!(printed.contains("greeting.html:1:11"));
        assert!(printed.contains("^^^^^"));
    }

    #[test]
    fn test_plain_display_hides_visual() {
        let error = Error::syntax("unexpected eof").with_pointer("{{ a", Region::point(4));

        assert!(!format!("{error}").contains("-->"));
        assert!(format!("{error:#}").contains("-->"));
    }
}

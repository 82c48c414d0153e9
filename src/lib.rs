//! Stencil - Template Expression Engine
//!
//! Templates are parsed by a [`TemplateParser`] into a [`ParsingState`], a
//! tree of [`Node`] instances that is rendered against a
//! [`RenderingContext`].
//!
//! ```
//! use stencil::{compile, RenderingContext, StandardVariableProvider};
//!
//! let template = compile("{% if admin %}<b>{{ name | upper }}</b>{% else %}{{ name }}{% end %}")
//!     .unwrap();
//! let mut context = RenderingContext::new().with_variable_provider(
//!     StandardVariableProvider::new()
//!         .with_must("admin", true)
//!         .with_must("name", "taylor & co"),
//! );
//!
//! assert_eq!(
//!     template.render(&mut context).unwrap(),
//!     "<b>TAYLOR &amp; CO</b>"
//! );
//! ```
mod compile;
mod container;
pub mod helper;
pub mod node;
mod region;
mod render;
mod report;
mod syntax;
mod view;

pub use compile::{compile, Configuration, ExpressionKind, ParsingState, TemplateParser};
pub use container::ViewHelperVariableContainer;
pub use helper::{Arguments, Helper, HelperResolver};
pub use node::Node;
pub use region::Region;
pub use render::{
    render, ContextId, ErrorHandler, RenderingContext, StandardErrorHandler,
    StandardVariableProvider, TemplatePaths, TolerantErrorHandler, VariableProvider,
};
pub use report::{Error, ErrorKind, Pointer, Visual};
pub use syntax::{Builder, Marker};
pub use view::{View, ViewId};

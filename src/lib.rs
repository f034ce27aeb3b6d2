//! Figures out which parts of an XML document an XPath 1.0 expression
//! depends on.
//!
//! The crates compose as follows: [`xpath1`] parses and evaluates
//! expressions, navigating the document exclusively through its `DomFacade`
//! trait; [`xdep_track`] supplies a recording facade and the two
//! dependency-computation strategies; [`xdep_xmlsource`] adapts `roxmltree`
//! documents to the node contract.
//!
//! ```no_run
//! use xdep::{XmlDocument, compute_dependencies};
//!
//! let doc = XmlDocument::parse("<doc><a/><b/></doc>")?;
//! let deps = compute_dependencies("a | b", doc.document_element())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use xdep_track::{
    DependencyError, NodeAccumulator, TrackingDomFacade, compute_dependencies,
    compute_minimal_dependencies,
};
pub use xdep_xmlsource::{XmlDocument, XmlNode};
pub use xdep_xpath1 as xpath1;

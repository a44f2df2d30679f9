//! Site navigation.
//!
//! Every page shows the same navigation list: a fixed `Home` entry first,
//! then one entry per other page in the order the pages were scanned. The
//! home page itself is skipped so it never appears twice.

use crate::types::{NavLink, Page};

pub fn build_navigation(pages: &[Page]) -> Vec<NavLink> {
    std::iter::once(NavLink::home())
        .chain(pages.iter().filter(|p| !p.is_home()).map(|p| NavLink {
            title: p.title.clone(),
            link: p.link.clone(),
        }))
        .collect()
}

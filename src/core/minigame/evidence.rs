/// Evidence-discovery game: find every hotspot and read what it reveals.
use crate::schema::scene::Hotspot;

/// What dismissing a description leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Searching,
    Solved,
}

#[derive(Debug, Clone, Default)]
pub struct EvidenceGame {
    pub active: bool,
    pub hotspots: Vec<Hotspot>,
    found: Vec<bool>,
    pub hotspots_found: usize,
    /// The description currently on screen, if any.
    pub current_description: Option<String>,
}

impl EvidenceGame {
    pub fn start(&mut self, hotspots: Vec<Hotspot>) {
        self.found = vec![false; hotspots.len()];
        self.hotspots = hotspots;
        self.hotspots_found = 0;
        self.current_description = None;
        self.active = true;
    }

    pub fn is_describing(&self) -> bool {
        self.current_description.is_some()
    }

    pub fn is_found(&self, index: usize) -> bool {
        self.found.get(index).copied().unwrap_or(false)
    }

    pub fn remaining(&self) -> usize {
        self.hotspots.len() - self.hotspots_found
    }

    /// Reveal hotspot `index`, returning its description. Clicks while a
    /// description is open, on found hotspots, or out of range do nothing.
    pub fn inspect(&mut self, index: usize) -> Option<&str> {
        if !self.active || self.is_describing() {
            return None;
        }
        let found = self.found.get_mut(index)?;
        if *found {
            return None;
        }
        *found = true;
        self.hotspots_found += 1;
        self.current_description = Some(self.hotspots[index].description.clone());
        self.current_description.as_deref()
    }

    /// Close the open description.
    pub fn dismiss(&mut self) -> Option<Progress> {
        if !self.active {
            return None;
        }
        self.current_description.take()?;
        if self.hotspots_found >= self.hotspots.len() {
            Some(Progress::Solved)
        } else {
            Some(Progress::Searching)
        }
    }

    pub(crate) fn stop(&mut self) {
        self.active = false;
        self.current_description = None;
    }
}

//! The three named formations and the gesture → formation table.

use std::fmt;

use hand_gesture::GestureSymbol;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Formation {
    #[default]
    Scattered,
    Gathered,
    Focused,
}

impl Formation {
    /// The formation a gesture asks for, from any state.
    /// `None` means "hold whatever is active".
    pub fn for_gesture(symbol: GestureSymbol) -> Option<Formation> {
        match symbol {
            GestureSymbol::Open  => Some(Formation::Scattered),
            GestureSymbol::Fist  => Some(Formation::Gathered),
            GestureSymbol::Pinch => Some(Formation::Focused),
            GestureSymbol::None  => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Formation::Scattered => "SCATTERED",
            Formation::Gathered  => "GATHERED",
            Formation::Focused   => "FOCUSED",
        }
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

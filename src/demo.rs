use bridgesim::design::{BeamRecord, Design};
use bridgesim::point;

/// Deck height of the demonstration truss, level with the anchors.
const DECK_Y: f64 = 450.0;
/// Height of the bottom chord.
const CHORD_Y: f64 = 540.0;
/// Horizontal distance between neighbouring joints of the same chord.
const PANEL: f64 = 160.0;

/// A Warren truss spanning the default gap.
///
/// Four deck joints hang between the anchors with a five-joint bottom chord
/// underneath; every bottom joint is braced to the deck joints either side of
/// it. Deck and chord are steel, the diagonals wood.
#[must_use]
pub fn demo_design() -> Design {
    let deck: Vec<_> = (0..4).map(|i| point(360.0 + PANEL * f64::from(i), DECK_Y)).collect();
    let chord: Vec<_> = (0..5).map(|i| point(280.0 + PANEL * f64::from(i), CHORD_Y)).collect();

    // Slots 0 and 1 are the anchors; deck joints follow, then the chord.
    let deck_slots: Vec<usize> = (2..2 + deck.len()).collect();
    let chord_slots: Vec<usize> = (2 + deck.len()..2 + deck.len() + chord.len()).collect();
    let beam = |start, end, material: &str| BeamRecord {
        start,
        end,
        material: material.to_string(),
    };

    let mut deck_line = vec![0];
    deck_line.extend(&deck_slots);
    deck_line.push(1);
    let mut beams: Vec<_> = deck_line
        .windows(2)
        .map(|pair| beam(pair[0], pair[1], "Steel"))
        .collect();
    beams.extend(chord_slots.windows(2).map(|pair| beam(pair[0], pair[1], "Steel")));
    for (i, &bottom) in chord_slots.iter().enumerate() {
        // The deck line includes the anchors, so bottom joint i sits between
        // entries i and i + 1.
        beams.push(beam(deck_line[i], bottom, "Wood"));
        beams.push(beam(bottom, deck_line[i + 1], "Wood"));
    }

    Design {
        joints: deck.into_iter().chain(chord).collect(),
        beams,
        load_weight: 60.0,
    }
}

use std::collections::HashMap;
use std::time::{Duration, Instant};

use banca_protocol::drawing::{Drawing, House, Lottery};
use chrono::NaiveTime;

/// The in-memory index of one day's drawings, built once per settlement run
/// and never mutated while bets are being decided. A slot can hold more than
/// one drawing when a house runs distinct draws at the same minute.
#[derive(Debug, Default)]
pub struct DrawingBoard {
    slots: HashMap<(NaiveTime, House, Lottery), Vec<Drawing>>,
    house_counts: HashMap<House, usize>,
}

impl DrawingBoard {
    pub fn load(drawings: Vec<Drawing>) -> Self {
        let mut board = DrawingBoard::default();
        for drawing in drawings {
            *board.house_counts.entry(drawing.house).or_default() += 1;
            board.slots.entry(drawing.slot()).or_default().push(drawing);
        }
        board.alias_bahia_federal();
        board
    }

    /// On federal days BAHIA settles its GERAL slot against the FEDERAL
    /// drawing. Historical policy, carried over; the alias happens here so
    /// the decision loop never special-cases it.
    fn alias_bahia_federal(&mut self) {
        let federal_slots: Vec<(NaiveTime, Vec<Drawing>)> = self
            .slots
            .iter()
            .filter(|((_, house, lottery), _)| {
                *house == House::Bahia && *lottery == Lottery::Federal
            })
            .map(|((time, _, _), drawings)| (*time, drawings.clone()))
            .collect();
        for (time, drawings) in federal_slots {
            let slot = (time, House::Bahia, Lottery::Geral);
            self.slots.entry(slot).or_insert_with(|| {
                drawings
                    .iter()
                    .cloned()
                    .map(|mut drawing| {
                        drawing.lottery = Lottery::Geral;
                        drawing
                    })
                    .collect()
            });
        }
    }

    pub fn drawings_at(&self, time: NaiveTime, house: House, lottery: Lottery) -> &[Drawing] {
        self.slots
            .get(&(time, house, lottery))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Drawings published so far for a house today; the skip planner compares
    /// this against the expected count.
    pub fn house_count(&self, house: House) -> usize {
        self.house_counts.get(&house).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Wall-clock budget of one job. New bet decisions stop once 80% of the
/// budget is burned so the loss batch can still be committed before the
/// scheduler kills the process.
#[derive(Clone, Debug)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Deadline {
            started: Instant::now(),
            budget,
        }
    }

    pub fn soft_expired(&self) -> bool {
        self.started.elapsed() >= self.budget.mul_f64(0.8)
    }

    pub fn remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banca_protocol::drawing::Prize;
    use chrono::NaiveDate;

    fn drawing(house: House, lottery: Lottery, time: (u32, u32)) -> Drawing {
        Drawing {
            date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            time: NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap(),
            house,
            lottery,
            prizes: (0..5).map(|i| Prize::new(format!("{i}{i}{i}{i}"))).collect(),
        }
    }

    #[test]
    fn bahia_federal_serves_the_geral_slot() {
        let board = DrawingBoard::load(vec![drawing(House::Bahia, Lottery::Federal, (19, 0))]);
        let time = NaiveTime::from_hms_opt(19, 0, 0).unwrap();
        let aliased = board.drawings_at(time, House::Bahia, Lottery::Geral);
        assert_eq!(aliased.len(), 1);
        assert_eq!(aliased[0].lottery, Lottery::Geral);
        // The original FEDERAL slot still answers.
        assert_eq!(
            board
                .drawings_at(time, House::Bahia, Lottery::Federal)
                .len(),
            1
        );
    }

    #[test]
    fn existing_geral_slot_is_not_overwritten() {
        let mut geral = drawing(House::Bahia, Lottery::Geral, (19, 0));
        geral.prizes[0] = Prize::new("9876");
        let marker = geral.prizes[0].number.clone();
        let board = DrawingBoard::load(vec![
            geral,
            drawing(House::Bahia, Lottery::Federal, (19, 0)),
        ]);
        let time = NaiveTime::from_hms_opt(19, 0, 0).unwrap();
        let slot = board.drawings_at(time, House::Bahia, Lottery::Geral);
        assert_eq!(slot.len(), 1);
        assert_eq!(slot[0].prizes[0].number, marker);
    }

    #[test]
    fn house_counts_accumulate() {
        let board = DrawingBoard::load(vec![
            drawing(House::Goias, Lottery::Look, (11, 0)),
            drawing(House::Goias, Lottery::Look, (14, 0)),
        ]);
        assert_eq!(board.house_count(House::Goias), 2);
        assert_eq!(board.house_count(House::Natal), 0);
    }
}

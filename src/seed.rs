use anyhow::Result;

use crate::db::Store;

const ALL_SQUARES: &[i32] = &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];

/// Default task catalog: (description, applicable squares, points).
#[must_use]
pub fn default_tasks() -> Vec<(&'static str, &'static [i32], i32)> {
    vec![
        ("Use a reusable cup", &[3, 4, 6, 7, 8, 9, 13, 14, 15], 5),
        ("Recycle an item", ALL_SQUARES, 10),
        ("Use the water fountain", &[3, 4, 7, 8, 9, 10, 11, 13, 14, 15], 5),
        ("Recycle used paper", ALL_SQUARES, 5),
        ("Visit the green space", &[2, 3, 6], 5),
        ("Pick up a piece of litter", ALL_SQUARES, 5),
        ("Turn off the lights", &[1, 2], 5),
        ("Donate to the food fridge", &[4], 5),
        ("Take something from the food fridge", &[4], 5),
        ("Turn off power outlet after use", ALL_SQUARES, 5),
        ("Buy a sustainable product", &[1, 4], 5),
        ("Fill up your water bottle", ALL_SQUARES, 5),
        ("Walk to campus", ALL_SQUARES, 5),
        ("Try a vegan food", ALL_SQUARES, 5),
        ("Read an article on sustainability", ALL_SQUARES, 5),
    ]
}

/// Default chance catalog: (description, score delta).
#[must_use]
pub fn default_chances() -> Vec<(&'static str, i32)> {
    vec![
        ("Bonus 5 points!", 5),
        ("Bonus 10 points !!", 10),
        ("Bonus 15 points", 15),
        ("Oh No! -5 points", -5),
        ("Oh No! -10 points", -10),
        ("Oh No! -15 points", -15),
    ]
}

/// Insert the default task catalog; returns how many rows were added.
pub async fn seed_tasks(store: &Store) -> Result<usize> {
    let tasks = default_tasks();
    for (description, squares, score) in &tasks {
        store.create_task(description, squares, *score).await?;
    }
    Ok(tasks.len())
}

/// Insert the default chance catalog; returns how many rows were added.
pub async fn seed_chances(store: &Store) -> Result<usize> {
    let chances = default_chances();
    for (description, score) in &chances {
        store.create_chance(description, *score).await?;
    }
    Ok(chances.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_catalog_shape() {
        let tasks = default_tasks();
        assert_eq!(tasks.len(), 15);
        // Every seeded task names its squares explicitly, so the
        // empty-squares policy never applies to seed data.
        assert!(tasks.iter().all(|(_, squares, _)| !squares.is_empty()));
        assert!(tasks.iter().all(|(_, _, score)| *score > 0));
    }

    #[test]
    fn chance_catalog_has_bonuses_and_penalties() {
        let chances = default_chances();
        assert_eq!(chances.len(), 6);
        assert!(chances.iter().any(|(_, score)| *score > 0));
        assert!(chances.iter().any(|(_, score)| *score < 0));
    }
}

use std::ptr::NonNull;

use robin_hash::define_maps;

#[derive(Debug)]
struct Player {
    name: String,
    best: u32,
    games: u32,
}

define_maps! {
    /// Latest score by player name.
    Scores: String => u32;
    /// Every player who has ever played, by id. Records never move.
    stable Players: u64 => Player;
}

fn main() {
    let mut scores = Scores::new();
    for (name, score) in [("Alice", 100), ("Bob", 200), ("Charlie", 300)] {
        scores.insert(name.to_string(), score);
    }
    println!("Map size: {}", scores.len());

    match scores.get(&"Alice".to_string()) {
        Some(score) => println!("Alice's score: {}", score),
        None => println!("Alice is missing"),
    }
    if !scores.contains_key(&"Dave".to_string()) {
        println!("Dave is missing (expected)");
    }

    let mut players = Players::new();
    let mut handles: Vec<(u64, NonNull<Player>)> = Vec::new();
    for (id, name) in ["Alice", "Bob", "Charlie"].iter().enumerate() {
        let id = id as u64;
        let player = Player {
            name: name.to_string(),
            best: scores.get(&name.to_string()).copied().unwrap_or(0),
            games: 1,
        };
        handles.push((id, players.insert_and_get_ptr(id, player)));
    }

    // Thousands of guests join and leave; the first three handles stay valid.
    for guest in 100..10_000u64 {
        players.insert(
            guest,
            Player {
                name: format!("guest-{guest}"),
                best: (guest % 97) as u32,
                games: 1,
            },
        );
        if guest % 3 == 0 {
            players.remove(&guest);
        }
    }

    for (id, handle) in &handles {
        assert_eq!(players.get_ptr(id), Some(*handle));
        // SAFETY: The player is still in the map and no other reference to
        // it is live.
        let player = unsafe { &mut *handle.as_ptr() };
        player.games += 1;
        println!(
            "{} (id {}): best {}, {} games",
            player.name, id, player.best, player.games
        );
    }

    let top = players
        .values()
        .max_by_key(|player| player.best)
        .map(|player| player.name.as_str())
        .unwrap_or("nobody");
    println!("Top player among {}: {}", players.len(), top);

    // Both maps are released here.
}

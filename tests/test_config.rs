use wave_shooter::config::*;
use wave_shooter::entities::{HostileKind, ObstacleKind, WeaponKind};
use wave_shooter::error::ConfigError;

#[test]
fn builtin_config_is_valid() {
    let config = GameConfig::default();
    config.validate().unwrap();
    assert_eq!(config.levels.len(), 5);
    assert!(config.level(5).is_some_and(|l| l.boss));
    let total: f64 = config.items.iter().map(|d| d.probability).sum();
    assert!(total < 1.0);
}

#[test]
fn toml_overrides_only_what_it_names() {
    let text = r#"
        auto_aim = true

        [tunables]
        combo_window = 60

        [[weapons]]
        kind = "pistol"
        damage = 40
        cooldown = 10
        speed = 12.0
        spread = 0.0
        projectile_count = 1
        clip_size = 8
        reload_ticks = 30
        pierce = 0
        lifetime = 60
        projectile_radius = 3.0
        fire = { mode = "single" }
    "#;
    let config = GameConfig::from_toml_str(text).unwrap();
    assert!(config.auto_aim);
    assert_eq!(config.tunables.combo_window, 60);
    assert_eq!(config.tunables.waves_per_level, Tunables::default().waves_per_level);
    let pistol = config.weapon(WeaponKind::Pistol);
    assert_eq!(pistol.damage, 40);
    assert_eq!(pistol.max_reserve, None);
    assert_eq!(config.weapon(WeaponKind::Shotgun), WeaponProfile::builtin(WeaponKind::Shotgun));
    assert_eq!(config.levels.len(), 5);
}

#[test]
fn drop_probabilities_above_one_are_rejected() {
    let text = r#"
        [[items]]
        kind = "heal"
        probability = 0.7

        [[items]]
        kind = "nuke"
        probability = 0.4
    "#;
    let err = GameConfig::from_toml_str(text).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = GameConfig::from_toml_str("tunables = [").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = GameConfig::load(std::path::Path::new("/definitely/not/here.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}

#[test]
fn obstacle_hp_defaults_by_kind() {
    assert_eq!(default_obstacle_hp(ObstacleKind::Wall), None);
    assert_eq!(default_obstacle_hp(ObstacleKind::Crate), Some(100));
    let spec = ObstacleSpec {
        rect: wave_shooter::geometry::Rect::new(0.0, 0.0, 10.0, 10.0),
        kind: ObstacleKind::Barrel,
        hp: Some(5),
    };
    assert_eq!(spec.starting_hp(), Some(5));
}

#[test]
fn combo_unlocks_match_exact_streaks() {
    let config = GameConfig::default();
    assert_eq!(config.combo_unlock_at(10), Some(WeaponKind::Smg));
    assert_eq!(config.combo_unlock_at(11), None);
}

#[test]
fn difficulty_modifiers_scale_monotonically() {
    use wave_shooter::entities::Difficulty;
    let easy = Difficulty::Easy.modifiers();
    let hard = Difficulty::Hard.modifiers();
    assert!(easy.hostile_hp < hard.hostile_hp);
    assert!(easy.damage_taken < hard.damage_taken);
    assert_eq!(HostileProfile::builtin(HostileKind::Boss).hp, 4000);
}

#[test]
fn degenerate_obstacle_rects_are_rejected() {
    let text = r#"
        [[levels]]
        id = 1
        name = "Yard"
        description = "Test yard."
        base_count = 3
        spawn_interval = 60
        hostile_kinds = ["basic"]
        background = [10, 10, 10]

        [[levels.obstacles]]
        rect = { x = 300.0, y = 100.0, w = -20.0, h = 40.0 }
        kind = "wall"
    "#;
    let err = GameConfig::from_toml_str(text).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let mut config = GameConfig::default();
    config.levels[0].obstacles[0].rect.h = f32::NAN;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

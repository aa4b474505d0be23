use stagectl_core::{
    BarChange, Command, DataStore, DmxAnimation, DmxAnimationFrame, DmxDevice, DmxDeviceGroup,
    DmxDeviceGroupSelector, DmxDeviceParams, DmxDeviceSelector, DmxDeviceType, DmxParams,
    DmxPreset, DmxScene, DmxSubScene, DmxTransition, DmxTransitionParams, EntityKind, Led,
    MidiCommand, RenderError, ScenePosition, Selector, Song, SongRenderer, MAX_SONG_FRAMES,
};

fn four_four(at: u64) -> BarChange {
    BarChange {
        at,
        note_value: 4,
        note_count: 4,
        speed: 120,
    }
}

fn selector(id: &str) -> Selector {
    Selector {
        id: id.to_string(),
        ..Default::default()
    }
}

fn front_group() -> Option<DmxDeviceGroupSelector> {
    Some(DmxDeviceGroupSelector {
        id: "front".to_string(),
        ..Default::default()
    })
}

fn fixture_store() -> DataStore {
    let mut store = DataStore::new();
    store.dmx_device_types.insert(
        "rgb".into(),
        DmxDeviceType {
            id: "rgb".into(),
            leds: vec![Led {
                position: 0,
                red: 0,
                green: 1,
                blue: 2,
                white: None,
            }],
            dimmer_channel: Some(3),
            ..Default::default()
        },
    );
    for (id, start_channel) in [("par1", 0), ("par2", 10)] {
        store.dmx_devices.insert(
            id.into(),
            DmxDevice {
                id: id.into(),
                type_id: "rgb".into(),
                universe: 0,
                start_channel,
                tags: vec!["front".into()],
                ..Default::default()
            },
        );
    }
    store.dmx_device_groups.insert(
        "front".into(),
        DmxDeviceGroup {
            id: "front".into(),
            devices: vec![DmxDeviceSelector {
                tags: vec!["front".into()],
                ..Default::default()
            }],
            ..Default::default()
        },
    );
    store
}

fn scene_with(device_params: DmxDeviceParams, preset: Option<Selector>) -> DmxScene {
    DmxScene {
        id: "wash".into(),
        note_value: 4,
        note_count: 4,
        sub_scenes: vec![DmxSubScene {
            at: vec![0],
            device_params: vec![device_params],
            preset,
        }],
        ..Default::default()
    }
}

fn song_with_scene(repeat: u8) -> Song {
    Song {
        id: "opener".into(),
        bar_changes: vec![four_four(0)],
        dmx_scenes: vec![ScenePosition {
            id: "wash".into(),
            at: 0,
            repeat,
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn value(cmd: &Command, universe: u16, channel: u16) -> Option<u8> {
    cmd.dmx_commands
        .iter()
        .find(|c| c.universe == universe && c.channel == channel)
        .map(|c| c.value)
}

fn red_wash_store() -> DataStore {
    let mut store = fixture_store();
    let scene = scene_with(
        DmxDeviceParams {
            group: front_group(),
            params: vec![DmxParams {
                red: Some(255),
                ..Default::default()
            }],
            ..Default::default()
        },
        None,
    );
    store.dmx_scenes.insert(scene.id.clone(), scene);
    store
}

#[test]
fn test_single_bar_song_renders_960_frames() {
    let store = DataStore::new();
    let song = Song {
        id: "empty".into(),
        bar_changes: vec![four_four(0)],
        ..Default::default()
    };

    let commands = SongRenderer::new(&store).render(&song).unwrap();
    assert_eq!(commands.len(), 960);
    for (i, cmd) in commands.iter().enumerate() {
        assert_eq!(cmd.state.frame, i as u64);
        assert_eq!(cmd.state.bar, 0);
        assert!(cmd.dmx_commands.is_empty());
    }
    assert_eq!(commands[0].bar_change, Some(four_four(0)));
    assert_eq!(commands[720].state.note, 3);
}

#[test]
fn test_missing_initial_bar_change() {
    let store = DataStore::new();
    let song = Song {
        id: "late".into(),
        bar_changes: vec![four_four(960)],
        ..Default::default()
    };
    assert_eq!(
        SongRenderer::new(&store).render(&song),
        Err(RenderError::MissingInitialBarChange)
    );
}

#[test]
fn test_group_params_land_on_firing_frame() {
    let store = red_wash_store();
    let commands = SongRenderer::new(&store)
        .render(&song_with_scene(1))
        .unwrap();

    assert_eq!(commands.len(), 960);
    let channels: Vec<_> = commands[0]
        .dmx_commands
        .iter()
        .map(|c| (c.universe, c.channel, c.value))
        .collect();
    assert_eq!(channels, vec![(0, 0, 255), (0, 10, 255)]);
    assert!(commands[1..].iter().all(|c| c.dmx_commands.is_empty()));
}

#[test]
fn test_render_is_idempotent() {
    let store = red_wash_store();
    let renderer = SongRenderer::new(&store);
    let song = song_with_scene(2);
    assert_eq!(renderer.render(&song).unwrap(), renderer.render(&song).unwrap());
}

#[test]
fn test_scene_repeat_extends_song() {
    let store = red_wash_store();
    let commands = SongRenderer::new(&store)
        .render(&song_with_scene(3))
        .unwrap();

    assert_eq!(commands.len(), 2880);
    for start in [0, 960, 1920] {
        assert_eq!(value(&commands[start], 0, 0), Some(255));
    }
    assert_eq!(commands[1920].state.bar, 2);
}

#[test]
fn test_unknown_device_is_reported() {
    let mut store = fixture_store();
    let scene = scene_with(
        DmxDeviceParams {
            device: Some(DmxDeviceSelector {
                id: "ghost".into(),
                ..Default::default()
            }),
            params: vec![DmxParams {
                red: Some(1),
                ..Default::default()
            }],
            ..Default::default()
        },
        None,
    );
    store.dmx_scenes.insert(scene.id.clone(), scene);

    let err = SongRenderer::new(&store)
        .render(&song_with_scene(1))
        .unwrap_err();
    match err {
        RenderError::ReferenceNotFound { kind, id, .. } => {
            assert_eq!(kind, EntityKind::Device);
            assert_eq!(id, "ghost");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_scene_is_reported() {
    let store = fixture_store();
    let err = SongRenderer::new(&store)
        .render(&song_with_scene(1))
        .unwrap_err();
    assert!(matches!(
        err,
        RenderError::ReferenceNotFound {
            kind: EntityKind::Scene,
            ..
        }
    ));
}

#[test]
fn test_direct_params_override_preset() {
    let mut store = fixture_store();
    store.dmx_presets.insert(
        "dim".into(),
        DmxPreset {
            id: "dim".into(),
            device_params: vec![DmxDeviceParams {
                group: front_group(),
                params: vec![DmxParams {
                    red: Some(10),
                    dimmer: Some(50),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        },
    );
    let scene = scene_with(
        DmxDeviceParams {
            device: Some(DmxDeviceSelector {
                id: "par1".into(),
                ..Default::default()
            }),
            params: vec![DmxParams {
                red: Some(255),
                ..Default::default()
            }],
            ..Default::default()
        },
        Some(selector("dim")),
    );
    store.dmx_scenes.insert(scene.id.clone(), scene);

    let commands = SongRenderer::new(&store)
        .render(&song_with_scene(1))
        .unwrap();
    let first = &commands[0];
    assert_eq!(value(first, 0, 0), Some(255));
    assert_eq!(value(first, 0, 3), Some(50));
    assert_eq!(value(first, 0, 10), Some(10));
    assert_eq!(value(first, 0, 13), Some(50));
}

#[test]
fn test_animation_loops_until_scene_end() {
    let mut store = fixture_store();
    store.dmx_animations.insert(
        "blink".into(),
        DmxAnimation {
            id: "blink".into(),
            length: 2,
            frames: vec![
                DmxAnimationFrame {
                    at: 0,
                    params: DmxParams {
                        dimmer: Some(0),
                        ..Default::default()
                    },
                },
                DmxAnimationFrame {
                    at: 1,
                    params: DmxParams {
                        dimmer: Some(255),
                        ..Default::default()
                    },
                },
            ],
            ..Default::default()
        },
    );
    let scene = scene_with(
        DmxDeviceParams {
            device: Some(DmxDeviceSelector {
                id: "par1".into(),
                ..Default::default()
            }),
            animation: Some(selector("blink")),
            ..Default::default()
        },
        None,
    );
    store.dmx_scenes.insert(scene.id.clone(), scene);

    let commands = SongRenderer::new(&store)
        .render(&song_with_scene(1))
        .unwrap();
    assert_eq!(value(&commands[0], 0, 3), Some(0));
    assert_eq!(value(&commands[1], 0, 3), Some(255));
    assert_eq!(value(&commands[5], 0, 3), Some(255));
    assert_eq!(value(&commands[958], 0, 3), Some(0));
    assert_eq!(value(&commands[959], 0, 3), Some(255));
}

#[test]
fn test_zero_length_animation_is_rejected() {
    let mut store = fixture_store();
    store.dmx_animations.insert(
        "broken".into(),
        DmxAnimation {
            id: "broken".into(),
            length: 0,
            ..Default::default()
        },
    );
    let scene = scene_with(
        DmxDeviceParams {
            group: front_group(),
            animation: Some(selector("broken")),
            ..Default::default()
        },
        None,
    );
    store.dmx_scenes.insert(scene.id.clone(), scene);

    assert!(matches!(
        SongRenderer::new(&store).render(&song_with_scene(1)),
        Err(RenderError::InvalidAnimation { .. })
    ));
}

#[test]
fn test_linear_transition() {
    let mut store = fixture_store();
    store.dmx_transitions.insert(
        "fade".into(),
        DmxTransition {
            id: "fade".into(),
            ease: "linear".into(),
            length: 4,
            params: vec![DmxTransitionParams {
                from: DmxParams {
                    dimmer: Some(0),
                    ..Default::default()
                },
                to: DmxParams {
                    dimmer: Some(200),
                    red: Some(90),
                    ..Default::default()
                },
            }],
            ..Default::default()
        },
    );
    let scene = scene_with(
        DmxDeviceParams {
            device: Some(DmxDeviceSelector {
                id: "par2".into(),
                ..Default::default()
            }),
            transition: Some(selector("fade")),
            ..Default::default()
        },
        None,
    );
    store.dmx_scenes.insert(scene.id.clone(), scene);

    let commands = SongRenderer::new(&store)
        .render(&song_with_scene(1))
        .unwrap();
    assert_eq!(value(&commands[0], 0, 13), Some(0));
    assert_eq!(value(&commands[2], 0, 13), Some(100));
    assert_eq!(value(&commands[4], 0, 13), Some(200));
    // channels only present in the target arrive on the last step
    assert_eq!(value(&commands[3], 0, 10), None);
    assert_eq!(value(&commands[4], 0, 10), Some(90));
    assert!(commands[5].dmx_commands.is_empty());
}

#[test]
fn test_midi_and_bar_change_markers() {
    let store = DataStore::new();
    let midi = MidiCommand {
        at: 1000,
        status: 0x90,
        data1: 60,
        data2: 100,
    };
    let song = Song {
        id: "cues".into(),
        bar_changes: vec![four_four(0), four_four(480)],
        midi_commands: vec![midi],
        ..Default::default()
    };

    let commands = SongRenderer::new(&store).render(&song).unwrap();
    // 480 frames, then whole bars from 480 until frame 1000 is covered
    assert_eq!(commands.len(), 480 + 960);
    assert_eq!(commands[1000].midi_commands, vec![midi]);
    assert_eq!(commands[480].bar_change, Some(four_four(480)));
    assert!(commands[481].bar_change.is_none());
}

#[test]
fn test_render_by_id() {
    let mut store = red_wash_store();
    let song = song_with_scene(1);
    store.songs.insert(song.id.clone(), song);

    let renderer = SongRenderer::new(&store);
    assert_eq!(renderer.render_by_id("opener").unwrap().len(), 960);
    assert!(matches!(
        renderer.render_by_id("encore"),
        Err(RenderError::ReferenceNotFound {
            kind: EntityKind::Song,
            ..
        })
    ));
}

#[test]
fn test_midi_at_end_of_range_is_rejected() {
    let store = DataStore::new();
    let song = Song {
        id: "runaway".into(),
        bar_changes: vec![four_four(0)],
        midi_commands: vec![MidiCommand {
            at: u64::MAX,
            status: 0x90,
            data1: 60,
            data2: 100,
        }],
        ..Default::default()
    };

    assert_eq!(
        SongRenderer::new(&store).render(&song),
        Err(RenderError::TimelineTooLong {
            limit: MAX_SONG_FRAMES
        })
    );
}

#[test]
fn test_distant_scene_is_rejected_before_layout() {
    let store = red_wash_store();
    let renderer = SongRenderer::new(&store);

    for (at, repeat) in [(MAX_SONG_FRAMES, 1), (u64::MAX - 100, 255)] {
        let mut song = song_with_scene(repeat);
        song.dmx_scenes[0].at = at;
        assert!(matches!(
            renderer.render(&song),
            Err(RenderError::TimelineTooLong { .. })
        ));
    }
}

#[test]
fn test_sub_scene_offset_past_song_end_is_dropped() {
    let mut store = fixture_store();
    let mut scene = scene_with(
        DmxDeviceParams {
            group: front_group(),
            params: vec![DmxParams {
                red: Some(255),
                ..Default::default()
            }],
            transition: Some(selector("fade")),
            ..Default::default()
        },
        None,
    );
    scene.sub_scenes[0].at = vec![u64::MAX];
    store.dmx_scenes.insert(scene.id.clone(), scene);
    store.dmx_transitions.insert(
        "fade".into(),
        DmxTransition {
            id: "fade".into(),
            ease: "linear".into(),
            length: u8::MAX,
            params: vec![DmxTransitionParams {
                from: DmxParams {
                    red: Some(0),
                    ..Default::default()
                },
                to: DmxParams {
                    red: Some(255),
                    ..Default::default()
                },
            }],
            ..Default::default()
        },
    );

    let commands = SongRenderer::new(&store)
        .render(&song_with_scene(1))
        .unwrap();
    assert_eq!(commands.len(), 960);
    assert!(commands.iter().all(|c| c.dmx_commands.is_empty()));
}

#[test]
fn test_song_params_sit_below_scenes() {
    let store = red_wash_store();
    let baseline = DmxDeviceParams {
        group: front_group(),
        params: vec![DmxParams {
            red: Some(10),
            dimmer: Some(80),
            ..Default::default()
        }],
        ..Default::default()
    };

    let mut song = song_with_scene(1);
    song.dmx_scenes[0].at = 960;
    song.dmx_device_params = vec![baseline];

    let commands = SongRenderer::new(&store).render(&song).unwrap();
    assert_eq!(commands.len(), 1920);
    assert_eq!(value(&commands[0], 0, 0), Some(10));
    assert_eq!(value(&commands[0], 0, 3), Some(80));
    assert_eq!(value(&commands[0], 0, 13), Some(80));
    assert_eq!(value(&commands[960], 0, 0), Some(255));

    // same frame: the scene wins
    song.dmx_scenes[0].at = 0;
    let commands = SongRenderer::new(&store).render(&song).unwrap();
    assert_eq!(value(&commands[0], 0, 0), Some(255));
    assert_eq!(value(&commands[0], 0, 3), Some(80));
}

#[test]
fn test_song_params_resolve_references() {
    let store = fixture_store();
    let song = Song {
        id: "opener".into(),
        bar_changes: vec![four_four(0)],
        dmx_device_params: vec![DmxDeviceParams {
            group: Some(DmxDeviceGroupSelector {
                id: "stage-left".into(),
                ..Default::default()
            }),
            ..Default::default()
        }],
        ..Default::default()
    };

    assert!(matches!(
        SongRenderer::new(&store).render(&song),
        Err(RenderError::ReferenceNotFound {
            kind: EntityKind::DeviceGroup,
            ..
        })
    ));
}

#[cfg(test)]
mod tests {
    use crate::hours::{weekday_number, BusinessHours, HoursError, MinuteRange};
    use bodywork_config::{BusinessHoursConfig, DurationOption, TimeBlock};
    use chrono::NaiveDate;

    fn config() -> BusinessHoursConfig {
        BusinessHoursConfig {
            working_days: vec![1, 2, 3, 4, 5],
            time_blocks: vec![
                TimeBlock {
                    day: None,
                    from: "09:00".into(),
                    to: "17:00".into(),
                },
                TimeBlock {
                    day: Some(4),
                    from: "18:00".into(),
                    to: "21:00".into(),
                },
            ],
            duration_options: vec![
                DurationOption {
                    minutes: 90,
                    price: 13000,
                    currency: None,
                    label: None,
                },
                DurationOption {
                    minutes: 60,
                    price: 9000,
                    currency: None,
                    label: None,
                },
            ],
            break_minutes: 15,
            slot_step_minutes: None,
            time_zone: Some("Europe/Zurich".into()),
            min_notice_minutes: None,
            currency: None,
        }
    }

    #[test]
    fn weekday_numbers_start_on_sunday() {
        assert_eq!(weekday_number(NaiveDate::from_ymd_opt(2030, 1, 6).unwrap()), 0);
        assert_eq!(weekday_number(NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()), 1);
        assert_eq!(weekday_number(NaiveDate::from_ymd_opt(2030, 1, 12).unwrap()), 6);
    }

    #[test]
    fn blocks_depend_on_day() {
        let hours = BusinessHours::from_config(&config()).unwrap();
        let monday = NaiveDate::from_ymd_opt(2030, 1, 7).unwrap();
        let thursday = NaiveDate::from_ymd_opt(2030, 1, 10).unwrap();
        let saturday = NaiveDate::from_ymd_opt(2030, 1, 12).unwrap();

        assert_eq!(
            hours.blocks_for(monday),
            vec![MinuteRange { from: 540, to: 1020 }]
        );
        assert_eq!(hours.blocks_for(thursday).len(), 2);
        assert!(hours.blocks_for(saturday).is_empty());
    }

    #[test]
    fn defaults_and_sorting() {
        let hours = BusinessHours::from_config(&config()).unwrap();
        assert_eq!(hours.slot_step_minutes, 15);
        assert_eq!(hours.min_notice_minutes, 0);
        assert_eq!(hours.time_zone, chrono_tz::Europe::Zurich);
        let minutes: Vec<u32> = hours.duration_options().iter().map(|d| d.minutes).collect();
        assert_eq!(minutes, vec![60, 90]);
        assert!(hours.offers_duration(90));
        assert!(!hours.offers_duration(45));
    }

    #[test]
    fn rejects_bad_configuration() {
        let mut bad_day = config();
        bad_day.working_days.push(7);
        assert_eq!(
            BusinessHours::from_config(&bad_day).unwrap_err(),
            HoursError::InvalidWeekday(7)
        );

        let mut inverted = config();
        inverted.time_blocks[0].to = "08:00".into();
        assert!(matches!(
            BusinessHours::from_config(&inverted),
            Err(HoursError::EmptyBlock { .. })
        ));

        let mut bad_time = config();
        bad_time.time_blocks[0].from = "9am".into();
        assert!(matches!(
            BusinessHours::from_config(&bad_time),
            Err(HoursError::InvalidTime(_))
        ));

        let mut no_durations = config();
        no_durations.duration_options.clear();
        assert_eq!(
            BusinessHours::from_config(&no_durations).unwrap_err(),
            HoursError::NoDurations
        );

        let mut bad_zone = config();
        bad_zone.time_zone = Some("Mars/Olympus".into());
        assert!(matches!(
            BusinessHours::from_config(&bad_zone),
            Err(HoursError::InvalidTimeZone(_))
        ));
    }
}
